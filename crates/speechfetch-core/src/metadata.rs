//! Probe metadata and its mapping onto download results

use crate::result::Metadata;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// Longest description kept in result metadata, in characters.
pub const DESCRIPTION_LIMIT: usize = 500;

/// What yt-dlp reports about a video before any media is downloaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Output path yt-dlp would use, when an output template was given
    #[serde(default, rename = "_filename")]
    pub filename: Option<PathBuf>,
}

impl VideoInfo {
    /// Parse `--dump-single-json` output. Empty output and `null` mean no info.
    pub fn from_probe_output(stdout: &str) -> Result<Option<Self>, serde_json::Error> {
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<VideoInfo>>(trimmed)
    }

    pub fn title_or_unknown(&self) -> &str {
        self.title.as_deref().unwrap_or("unknown")
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.unwrap_or(0.0).max(0.0)
    }

    /// Metadata attached to a successful result.
    pub fn to_result_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("video_id".to_string(), opt(&self.id));
        metadata.insert("uploader".to_string(), opt(&self.uploader));
        metadata.insert("upload_date".to_string(), opt(&self.upload_date));
        metadata.insert(
            "view_count".to_string(),
            self.view_count.map(Value::from).unwrap_or(Value::Null),
        );
        metadata.insert(
            "description".to_string(),
            Value::from(truncate_chars(
                self.description.as_deref().unwrap_or(""),
                DESCRIPTION_LIMIT,
            )),
        );
        metadata
    }

    /// Expand a `{title}`-style filename template with this video's fields.
    pub fn render_template(&self, template: &str) -> String {
        let rendered = template
            .replace("{title}", self.title.as_deref().unwrap_or("NA"))
            .replace("{id}", self.id.as_deref().unwrap_or("NA"))
            .replace("{uploader}", self.uploader.as_deref().unwrap_or("NA"));
        sanitize_filename(&rendered)
    }
}

fn opt(value: &Option<String>) -> Value {
    value.as_deref().map(Value::from).unwrap_or(Value::Null)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Sanitize filename for filesystem
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
