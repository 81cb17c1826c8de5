//! Outcome of a single download attempt

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Scalar metadata attached to a successful download (video id, uploader, ...).
pub type Metadata = BTreeMap<String, Value>;

/// Why a download did not produce a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The URL does not belong to the source
    InvalidUrl,
    /// The probed video is longer than the configured limit
    DurationExceeded,
    /// The probe returned nothing usable
    ExtractionFailed,
    /// The external tool reported a download-level error
    TransferFailed,
    /// The tool finished but the output file could not be located
    FileNotFound,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadedAudio {
    pub file_path: PathBuf,
    pub title: String,
    /// Seconds, as reported by the probe
    pub duration: f64,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome {
    Success(DownloadedAudio),
    Failure { kind: FailureKind, error_message: String },
}

/// Immutable record of one download attempt.
///
/// Either the payload (file path, title, duration, metadata) is present or
/// an error message is, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadResult {
    source_url: String,
    downloaded_at: DateTime<Local>,
    #[serde(flatten)]
    outcome: Outcome,
}

impl DownloadResult {
    pub fn success(source_url: impl Into<String>, audio: DownloadedAudio) -> Self {
        Self {
            source_url: source_url.into(),
            downloaded_at: Local::now(),
            outcome: Outcome::Success(audio),
        }
    }

    pub fn failure(
        source_url: impl Into<String>,
        kind: FailureKind,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            downloaded_at: Local::now(),
            outcome: Outcome::Failure {
                kind,
                error_message: error_message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn downloaded_at(&self) -> DateTime<Local> {
        self.downloaded_at
    }

    pub fn audio(&self) -> Option<&DownloadedAudio> {
        match self.outcome {
            Outcome::Success(ref audio) => Some(audio),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.audio().map(|a| a.file_path.as_path())
    }

    pub fn title(&self) -> Option<&str> {
        self.audio().map(|a| a.title.as_str())
    }

    pub fn duration(&self) -> Option<f64> {
        self.audio().map(|a| a.duration)
    }

    /// `None` for failed downloads.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.audio().map(|a| &a.metadata)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.outcome {
            Outcome::Failure {
                ref error_message, ..
            } => Some(error_message),
            Outcome::Success(_) => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.outcome {
            Outcome::Failure { kind, .. } => Some(kind),
            Outcome::Success(_) => None,
        }
    }
}

impl std::fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            Outcome::Success(ref audio) => write!(
                f,
                "DownloadResult(success=true, title='{}', duration={:.1}s)",
                audio.title, audio.duration
            ),
            Outcome::Failure {
                ref error_message, ..
            } => write!(f, "DownloadResult(success=false, error='{}')", error_message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio() -> DownloadedAudio {
        let mut metadata = Metadata::new();
        metadata.insert("uploader".to_string(), Value::from("jawed"));
        DownloadedAudio {
            file_path: PathBuf::from("/tmp/Me at the zoo.wav"),
            title: "Me at the zoo".to_string(),
            duration: 19.0,
            metadata,
        }
    }

    #[test]
    fn test_success_pairing() {
        let result = DownloadResult::success("https://youtu.be/jNQXAC9IVRw", audio());
        assert!(result.is_success());
        assert_eq!(result.title(), Some("Me at the zoo"));
        assert_eq!(result.duration(), Some(19.0));
        assert_eq!(result.error_message(), None);
        assert_eq!(result.failure_kind(), None);
        assert_eq!(result.to_string(), "DownloadResult(success=true, title='Me at the zoo', duration=19.0s)");
    }

    #[test]
    fn test_failure_pairing() {
        let result = DownloadResult::failure("nope", FailureKind::InvalidUrl, "Invalid YouTube URL: nope");
        assert!(!result.is_success());
        assert_eq!(result.file_path(), None);
        assert_eq!(result.title(), None);
        assert_eq!(result.duration(), None);
        assert!(result.metadata().is_none());
        assert_eq!(result.error_message(), Some("Invalid YouTube URL: nope"));
        assert_eq!(result.source_url(), "nope");
    }

    #[test]
    fn test_json_shape() {
        let result = DownloadResult::success("https://youtu.be/jNQXAC9IVRw", audio());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["title"], "Me at the zoo");
        assert_eq!(json["metadata"]["uploader"], "jawed");
        assert!(json.get("error_message").is_none());

        let failed = DownloadResult::failure("x", FailureKind::FileNotFound, "Downloaded file not found");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "file_not_found");
        assert!(json.get("file_path").is_none());
    }
}
