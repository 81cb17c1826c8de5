//! Error types for speechfetch-core

use crate::result::FailureKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpeechFetchError>;

#[derive(Error, Debug)]
pub enum SpeechFetchError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Everything that can go wrong inside one download call.
///
/// These never leave the downloader as `Err`; they are folded into a failed
/// [`DownloadResult`](crate::DownloadResult) at the call boundary.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to extract video info")]
    NoVideoInfo,

    #[error("Failed to parse video info: {0}")]
    InfoParse(String),

    #[error("Video duration ({duration}s) exceeds limit ({limit}s)")]
    DurationExceeded { duration: f64, limit: f64 },

    #[error("Download error: {0}")]
    YtDlp(String),

    #[error("Download error: Video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("Downloaded file not found")]
    FileNotFound,

    #[error("Unexpected error: yt-dlp not found. Install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("Unexpected error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DownloadError::InvalidUrl(_) => FailureKind::InvalidUrl,
            DownloadError::NoVideoInfo | DownloadError::InfoParse(_) => {
                FailureKind::ExtractionFailed
            }
            DownloadError::DurationExceeded { .. } => FailureKind::DurationExceeded,
            DownloadError::YtDlp(_) | DownloadError::VideoUnavailable(_) => {
                FailureKind::TransferFailed
            }
            DownloadError::FileNotFound => FailureKind::FileNotFound,
            DownloadError::YtDlpNotFound | DownloadError::Io(_) => FailureKind::Unexpected,
        }
    }
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("FFmpeg not found. Install with: brew install ffmpeg")]
    FfmpegNotFound,

    #[error("No audio stream found in {0}")]
    NoAudioStream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
