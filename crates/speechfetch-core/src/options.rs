//! Download settings and their translation into yt-dlp options

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Browser user agent sent to YouTube; the default yt-dlp one draws 403s.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    M4a,
    Opus,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Opus => "opus",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Wav => write!(f, "WAV"),
            AudioFormat::Mp3 => write!(f, "MP3"),
            AudioFormat::M4a => write!(f, "M4A"),
            AudioFormat::Opus => write!(f, "Opus"),
        }
    }
}

/// Audio download settings.
///
/// The defaults target speech transcription: 16 kHz mono WAV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub format: AudioFormat,
    /// Bitrate in kbps, only meaningful for lossy formats
    pub quality: u32,
    /// Target sample rate in Hz; `None` or 0 keeps the original rate
    pub sample_rate: Option<u32>,
    pub mono: bool,
    /// Longest accepted video in seconds
    pub max_duration: Option<f64>,
    /// Output filename without extension; `{title}`, `{id}` and `{uploader}` are expanded per video
    pub filename_template: String,
    pub embed_metadata: bool,
    /// Browser to borrow cookies from (chrome, firefox, edge, ...). The browser must be closed.
    pub cookies_from_browser: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self::transcription()
    }
}

impl DownloadConfig {
    /// wav, 16 kHz, mono
    pub fn transcription() -> Self {
        Self {
            format: AudioFormat::Wav,
            quality: 192,
            sample_rate: Some(16_000),
            mono: true,
            max_duration: None,
            filename_template: "{title}".to_string(),
            embed_metadata: true,
            cookies_from_browser: None,
        }
    }

    /// wav, 44.1 kHz, stereo
    pub fn high_quality() -> Self {
        Self {
            sample_rate: Some(44_100),
            mono: false,
            ..Self::transcription()
        }
    }

    /// mp3 at 128 kbps, 16 kHz, mono
    pub fn compact() -> Self {
        Self {
            format: AudioFormat::Mp3,
            quality: 128,
            ..Self::transcription()
        }
    }

    /// Sample rate to resample to, if any.
    pub fn target_sample_rate(&self) -> Option<u32> {
        self.sample_rate.filter(|rate| *rate > 0)
    }

    /// Duration limit in seconds, if any. Non-positive limits are ignored.
    pub fn duration_limit(&self) -> Option<f64> {
        self.max_duration.filter(|limit| *limit > 0.0)
    }

    /// Translate these settings into yt-dlp options. Pure.
    pub fn to_external_options(&self) -> YtDlpOptions {
        let mut postprocessor_args = Vec::new();

        if let Some(rate) = self.target_sample_rate() {
            postprocessor_args.extend(["-ar".to_string(), rate.to_string()]);
        }

        if self.mono {
            postprocessor_args.extend(["-ac".to_string(), "1".to_string()]);
        }

        YtDlpOptions {
            format_selector: "bestaudio/best".to_string(),
            audio_format: self.format,
            audio_quality: format!("{}K", self.quality),
            output_template: format!("{}.%(ext)s", to_ytdlp_template(&self.filename_template)),
            embed_metadata: self.embed_metadata,
            user_agent: USER_AGENT.to_string(),
            cookies_from_browser: self.cookies_from_browser.clone(),
            postprocessor_args,
        }
    }
}

/// Named bundles of [`DownloadConfig`] defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    Transcription,
    HighQuality,
    Compact,
}

impl Preset {
    pub fn config(&self) -> DownloadConfig {
        match self {
            Preset::Transcription => DownloadConfig::transcription(),
            Preset::HighQuality => DownloadConfig::high_quality(),
            Preset::Compact => DownloadConfig::compact(),
        }
    }
}

/// yt-dlp options for one download, as structured data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YtDlpOptions {
    pub format_selector: String,
    pub audio_format: AudioFormat,
    pub audio_quality: String,
    /// yt-dlp output template, relative until [`rooted_at`](Self::rooted_at) is applied
    pub output_template: String,
    pub embed_metadata: bool,
    pub user_agent: String,
    pub cookies_from_browser: Option<String>,
    /// Arguments handed to ffmpeg after extraction
    pub postprocessor_args: Vec<String>,
}

impl YtDlpOptions {
    /// Place the output template under `dir`.
    pub fn rooted_at(mut self, dir: &Path) -> Self {
        let dir = dir.to_string_lossy().replace('%', "%%");
        self.output_template = Path::new(&dir)
            .join(&self.output_template)
            .to_string_lossy()
            .into_owned();
        self
    }

    /// Arguments shared by the probe and the transfer.
    pub fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--user-agent".to_string(),
            self.user_agent.clone(),
            "-f".to_string(),
            self.format_selector.clone(),
            "-o".to_string(),
            self.output_template.clone(),
        ];

        if let Some(ref browser) = self.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }

        args
    }

    /// Full argument list for the transfer step, URL excluded.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.common_args();

        args.extend([
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.audio_format.extension().to_string(),
            "--audio-quality".to_string(),
            self.audio_quality.clone(),
        ]);

        if !self.postprocessor_args.is_empty() {
            args.push("--postprocessor-args".to_string());
            args.push(format!("ffmpeg:{}", self.postprocessor_args.join(" ")));
        }

        if self.embed_metadata {
            args.push("--embed-metadata".to_string());
        }

        args
    }
}

/// Rewrite `{title}`-style placeholders into yt-dlp's `%(title)s` fields.
fn to_ytdlp_template(template: &str) -> String {
    // A bare `%` would start an output-template field
    ["title", "id", "uploader"]
        .iter()
        .fold(template.replace('%', "%%"), |acc, field| {
            acc.replace(&format!("{{{}}}", field), &format!("%({})s", field))
        })
}
