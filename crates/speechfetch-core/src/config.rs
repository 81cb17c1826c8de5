//! Configuration management for speechfetch

use crate::downloader::YouTubeDownloader;
use crate::error::ConfigError;
use crate::options::{AudioFormat, DownloadConfig, Preset};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub download: DownloadSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output directory
    pub default_directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_directory: PathBuf::from("."),
        }
    }
}

/// `[download]` table: a preset plus optional per-field overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSection {
    pub preset: Preset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    /// 0 keeps the original sample rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mono: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies_from_browser: Option<String>,
    /// Inspect downloaded files with ffmpeg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
}

impl DownloadSection {
    /// The preset with every configured override applied.
    pub fn to_download_config(&self) -> DownloadConfig {
        let base = self.preset.config();
        DownloadConfig {
            format: self.format.unwrap_or(base.format),
            quality: self.quality.unwrap_or(base.quality),
            sample_rate: self.sample_rate.or(base.sample_rate),
            mono: self.mono.unwrap_or(base.mono),
            max_duration: self.max_duration.or(base.max_duration),
            filename_template: self
                .filename_template
                .clone()
                .unwrap_or(base.filename_template),
            embed_metadata: self.embed_metadata.unwrap_or(base.embed_metadata),
            cookies_from_browser: self
                .cookies_from_browser
                .clone()
                .or(base.cookies_from_browser),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Load from default config directory
        if let Some(path) = Self::default_path() {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
            }
        }

        // Load from specified config file
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment, e.g. SPEECHFETCH_DOWNLOAD__SAMPLE_RATE
        figment = figment.merge(Env::prefixed("SPEECHFETCH_").split("__"));

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/speechfetch/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("speechfetch/config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(limit) = self.download.max_duration {
            if limit.is_nan() || limit <= 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "download.max_duration must be positive, got {}",
                    limit
                )));
            }
        }
        if self.download.filename_template.as_deref() == Some("") {
            return Err(ConfigError::InvalidValue(
                "download.filename_template must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.yt_dlp {
            Ok(path.clone())
        } else {
            which::which("yt-dlp")
                .map_err(|_| ConfigError::InvalidValue("yt-dlp not found in PATH".to_string()))
        }
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.ffmpeg {
            Ok(path.clone())
        } else {
            which::which("ffmpeg")
                .map_err(|_| ConfigError::InvalidValue("ffmpeg not found in PATH".to_string()))
        }
    }

    /// A downloader wired with the configured tool paths.
    pub fn downloader(&self, download: DownloadConfig) -> YouTubeDownloader {
        let mut downloader = YouTubeDownloader::new(download)
            .with_verification(self.download.verify.unwrap_or(true));
        if let Some(ref path) = self.paths.yt_dlp {
            downloader = downloader.with_yt_dlp_path(path);
        }
        if let Some(ref path) = self.paths.ffmpeg {
            downloader = downloader.with_ffmpeg_path(path);
        }
        downloader
    }
}
