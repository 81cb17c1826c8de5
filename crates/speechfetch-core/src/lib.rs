//! speechfetch-core: YouTube audio acquisition for speech-processing pipelines

pub mod config;
pub mod downloader;
pub mod error;
pub mod metadata;
pub mod options;
pub mod progress;
pub mod result;
pub mod source;
pub mod verify;

pub use config::Config;
pub use downloader::{extract_video_id, validate_youtube_url, YouTubeDownloader};
pub use error::{ConfigError, DownloadError, Result, SpeechFetchError, VerifyError};
pub use options::{AudioFormat, DownloadConfig, Preset, YtDlpOptions};
pub use result::{DownloadResult, DownloadedAudio, FailureKind, Metadata};
pub use source::{AudioSource, ProgressFn};
