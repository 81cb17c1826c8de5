use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::debug;

use crate::args::DownloadOptions;
use speechfetch_core::{AudioSource, Config, DownloadConfig, DownloadResult};

pub async fn run(url: &str, options: &DownloadOptions, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| config.output.default_directory.clone());

    let download_config = build_download_config(&config, options);
    debug!("Download settings: {:?}", download_config);
    let downloader = config
        .downloader(download_config)
        .with_verification(!options.no_verify && config.download.verify.unwrap_or(true));

    let pb = if options.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}",
        )?
        .progress_chars("=>-"),
    );

    let bar = pb.clone();
    let on_progress = move |progress: f64, status: &str| {
        bar.set_position(progress.round() as u64);
        bar.set_message(status.to_string());
    };

    let result = downloader
        .download(url, &output_dir, Some(&on_progress))
        .await;

    if result.is_success() {
        pb.finish_with_message("Done");
    } else {
        pb.abandon_with_message("Failed");
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    match result.error_message() {
        Some(message) => bail!("{}", message),
        None => Ok(()),
    }
}

/// Configured settings, then the CLI's preset, then individual CLI flags.
fn build_download_config(config: &Config, options: &DownloadOptions) -> DownloadConfig {
    let mut section = config.download.clone();
    if let Some(preset) = options.preset {
        section.preset = preset.into();
    }
    let mut download = section.to_download_config();

    if let Some(format) = options.format {
        download.format = format.into();
    }
    if let Some(quality) = options.quality {
        download.quality = quality;
    }
    if let Some(rate) = options.sample_rate {
        download.sample_rate = Some(rate);
    }
    if options.stereo {
        download.mono = false;
    }
    if let Some(limit) = options.max_duration {
        download.max_duration = Some(limit);
    }
    if let Some(ref template) = options.template {
        download.filename_template = template.clone();
    }
    if options.no_metadata {
        download.embed_metadata = false;
    }
    if let Some(ref browser) = options.cookies_from_browser {
        download.cookies_from_browser = Some(browser.clone());
    }

    download
}

fn print_summary(result: &DownloadResult) {
    let Some(audio) = result.audio() else {
        return;
    };

    println!("\nTitle:    {}", audio.title);
    println!("Duration: {:.1}s", audio.duration);
    if let Some(uploader) = audio.metadata.get("uploader").and_then(|v| v.as_str()) {
        println!("Uploader: {}", uploader);
    }
    println!("Output:   {}", audio.file_path.display());
}
