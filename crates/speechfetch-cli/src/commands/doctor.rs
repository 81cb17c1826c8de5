use anyhow::{bail, Result};
use std::path::Path;
use std::process::Command;
use speechfetch_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    println!("speechfetch dependency check\n");

    let mut all_ok = true;

    // Check config
    print!("config:        ");
    let config = match Config::load(config_path) {
        Ok(config) => {
            println!("OK");
            config
        }
        Err(e) => {
            println!("INVALID ({})", e);
            all_ok = false;
            Config::default()
        }
    };

    // Check yt-dlp
    print!("yt-dlp:        ");
    match config.yt_dlp_path() {
        Ok(path) => match tool_version(&path, "--version") {
            Some(v) => println!("OK ({})", v),
            None => {
                println!("FOUND but failed to get version ({})", path.display());
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("           Install with: pip install yt-dlp");
            all_ok = false;
        }
    }

    // Check FFmpeg
    print!("ffmpeg:        ");
    match config.ffmpeg_path() {
        Ok(path) => match tool_version(&path, "-version") {
            // First line looks like "ffmpeg version 6.1.1 Copyright ..."
            Some(first_line) => {
                let version_part = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                println!("OK ({})", version_part);
            }
            None => {
                println!("FOUND but failed to get version ({})", path.display());
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("           Install with: brew install ffmpeg");
            all_ok = false;
        }
    }

    // Check output directory
    print!("output dir:    ");
    let output_dir = &config.output.default_directory;
    match std::fs::metadata(output_dir) {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => println!("OK ({})", output_dir.display()),
        Ok(_) => {
            println!("NOT WRITABLE ({})", output_dir.display());
            all_ok = false;
        }
        Err(_) => println!("MISSING ({}, created on first download)", output_dir.display()),
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
        Ok(())
    } else {
        bail!("Some dependencies are missing. See above for installation instructions.")
    }
}

/// First line of `<tool> <flag>` output, if the tool runs.
fn tool_version(path: &Path, flag: &str) -> Option<String> {
    let out = Command::new(path).arg(flag).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
