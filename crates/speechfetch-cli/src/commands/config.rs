use anyhow::Result;
use std::path::Path;
use speechfetch_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("speechfetch configuration\n");

    println!("[paths]");
    if let Some(ref p) = config.paths.yt_dlp {
        println!("  yt_dlp = {:?}", p);
    } else {
        println!("  yt_dlp = (auto-detect)");
    }
    if let Some(ref p) = config.paths.ffmpeg {
        println!("  ffmpeg = {:?}", p);
    } else {
        println!("  ffmpeg = (auto-detect)");
    }

    println!("\n[output]");
    println!("  default_directory = {:?}", config.output.default_directory);

    println!("\n[download]");
    print!("{}", indent(&toml::to_string_pretty(&config.download)?));

    println!("\nEffective download settings:");
    let effective = config.download.to_download_config();
    print!("{}", indent(&toml::to_string_pretty(&effective)?));

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    if let Some(p) = config_path {
        println!("  1. {} (specified)", p.display());
    }
    if let Some(default) = Config::default_path() {
        println!("  2. {}", default.display());
    }
    println!("  3. Environment variables (SPEECHFETCH_*, `__` separates sections)");

    Ok(())
}

fn indent(s: &str) -> String {
    s.lines().map(|l| format!("  {}\n", l)).collect()
}
