//! Post-download inspection of audio files using FFmpeg

use crate::error::VerifyError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug)]
pub struct AudioInspector {
    ffmpeg_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    /// `None` for channel layouts ffmpeg reports by a name we do not know
    pub channels: Option<u8>,
    /// Seconds; `None` when ffmpeg printed no duration
    pub duration: Option<f64>,
}

impl AudioInfo {
    /// Whether the measured length is off from `expected` by more than
    /// `tolerance` seconds. Unknown lengths never count as a mismatch.
    pub fn duration_differs(&self, expected: f64, tolerance: f64) -> bool {
        match self.duration {
            Some(actual) if expected > 0.0 => (actual - expected).abs() > tolerance,
            _ => false,
        }
    }
}

impl AudioInspector {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Locate ffmpeg on `PATH`.
    pub fn from_path() -> Result<Self, VerifyError> {
        which::which("ffmpeg")
            .map(Self::new)
            .map_err(|_| VerifyError::FfmpegNotFound)
    }

    /// Get audio file info (sample rate, channels, duration)
    pub async fn inspect(&self, input: &Path) -> Result<AudioInfo, VerifyError> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .arg("-i")
            .arg(input)
            .args(["-f", "null", "-"])
            .kill_on_drop(true)
            .output()
            .await?;

        // FFmpeg prints stream info to stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("ffmpeg stream info for {}:\n{}", input.display(), stderr);

        parse_audio_info(&stderr)
            .ok_or_else(|| VerifyError::NoAudioStream(input.display().to_string()))
    }
}

/// Parse the `Stream #0:0: Audio: ...` and `Duration:` lines of ffmpeg output.
pub fn parse_audio_info(ffmpeg_output: &str) -> Option<AudioInfo> {
    let stream = ffmpeg_output.lines().find(|l| l.contains("Audio:"))?;

    Some(AudioInfo {
        sample_rate: parse_sample_rate(stream)?,
        channels: parse_channels(stream),
        duration: parse_duration(ffmpeg_output),
    })
}

fn sample_rate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+) Hz").expect("valid sample rate regex"))
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Duration: (\d+):(\d+):(\d+)\.(\d+)").expect("valid duration regex")
    })
}

fn parse_sample_rate(stream_line: &str) -> Option<u32> {
    let caps = sample_rate_re().captures(stream_line)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Channel count from the layout field that follows the sample rate,
/// e.g. `mono`, `stereo`, `5.1(side)` or `3 channels`.
fn parse_channels(stream_line: &str) -> Option<u8> {
    let mut fields = stream_line.split(',').map(str::trim);
    fields.find(|f| f.ends_with(" Hz"))?;
    let layout = fields.next()?;
    let layout = layout.split('(').next().unwrap_or(layout).trim();

    if let Some(count) = layout.strip_suffix(" channels") {
        return count.trim().parse().ok();
    }

    let channels = match layout {
        "mono" => 1,
        "stereo" | "downmix" => 2,
        "2.1" | "3.0" => 3,
        "3.1" | "4.0" | "quad" => 4,
        "4.1" | "5.0" => 5,
        "5.1" | "6.0" => 6,
        "6.1" | "7.0" => 7,
        "7.1" => 8,
        _ => return None,
    };
    Some(channels)
}

fn parse_duration(ffmpeg_output: &str) -> Option<f64> {
    let caps = duration_re().captures(ffmpeg_output)?;

    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    let centiseconds: f64 = caps.get(4)?.as_str().parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds + centiseconds / 100.0)
}
