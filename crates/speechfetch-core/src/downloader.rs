//! YouTube audio downloader using yt-dlp

use crate::error::DownloadError;
use crate::metadata::VideoInfo;
use crate::options::{DownloadConfig, YtDlpOptions};
use crate::progress::{Reporter, PROGRESS_TEMPLATE, TRANSFER_START};
use crate::result::{DownloadResult, DownloadedAudio, Metadata};
use crate::source::{AudioSource, ProgressFn};
use crate::verify::AudioInspector;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::SystemTime;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

const YOUTUBE_PATTERNS: [&str; 4] = [
    r"^(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})",
    r"^(?:https?://)?(?:www\.)?youtu\.be/([a-zA-Z0-9_-]{11})",
    r"^(?:https?://)?(?:www\.)?youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
    r"^(?:https?://)?(?:www\.)?youtube\.com/live/([a-zA-Z0-9_-]{11})",
];

/// Seconds the transcoded file may differ from the probed duration.
const DURATION_TOLERANCE: f64 = 2.0;

fn youtube_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        YOUTUBE_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("valid YouTube URL pattern"))
            .collect()
    })
}

/// Whether `url` is a YouTube watch, youtu.be, shorts or live URL.
pub fn validate_youtube_url(url: &str) -> bool {
    youtube_patterns().iter().any(|re| re.is_match(url))
}

/// The 11 character video id embedded in a YouTube URL.
pub fn extract_video_id(url: &str) -> Option<&str> {
    youtube_patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Downloads audio from YouTube videos by driving yt-dlp.
///
/// Every call probes the video first, rejects it if it is longer than
/// [`DownloadConfig::max_duration`], and only then transfers and transcodes
/// the audio. Nothing per-call is stored on the downloader, so one instance
/// can serve overlapping downloads.
///
/// When the output file cannot be predicted from the probe, the newest file
/// with the configured extension in the output directory is taken instead.
/// Downloads sharing an output directory can therefore pick up each other's
/// files; give concurrent downloads their own directories.
#[derive(Debug, Clone)]
pub struct YouTubeDownloader {
    config: DownloadConfig,
    yt_dlp_path: Option<PathBuf>,
    ffmpeg_path: Option<PathBuf>,
    verify: bool,
}

impl Default for YouTubeDownloader {
    fn default() -> Self {
        Self::new(DownloadConfig::transcription())
    }
}

impl YouTubeDownloader {
    pub fn new(config: DownloadConfig) -> Self {
        Self {
            config,
            yt_dlp_path: None,
            ffmpeg_path: None,
            verify: true,
        }
    }

    /// Use this yt-dlp binary instead of the one on `PATH`.
    pub fn with_yt_dlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.yt_dlp_path = Some(path.into());
        self
    }

    /// Use this ffmpeg binary, both for yt-dlp's post-processing and for verification.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    /// Toggle the post-download ffmpeg inspection.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn extract_video_id<'a>(&self, url: &'a str) -> Option<&'a str> {
        extract_video_id(url)
    }

    fn yt_dlp(&self) -> Result<PathBuf, DownloadError> {
        match self.yt_dlp_path {
            Some(ref path) => Ok(path.clone()),
            None => which::which("yt-dlp").map_err(|_| DownloadError::YtDlpNotFound),
        }
    }

    async fn run(
        &self,
        url: &str,
        output_dir: &Path,
        reporter: Reporter<'_>,
    ) -> Result<DownloadedAudio, DownloadError> {
        if !self.validate_url(url) {
            return Err(DownloadError::InvalidUrl(url.to_string()));
        }

        tokio::fs::create_dir_all(output_dir).await?;

        let options = self.config.to_external_options().rooted_at(output_dir);
        let yt_dlp = self.yt_dlp()?;

        reporter.report(0.0, "Extracting video info...");
        let info = self
            .probe(&yt_dlp, &options, url)
            .await?
            .ok_or(DownloadError::NoVideoInfo)?;

        let duration = info.duration_secs();
        if let Some(limit) = self.config.duration_limit() {
            if duration > limit {
                return Err(DownloadError::DurationExceeded { duration, limit });
            }
        }

        reporter.report(TRANSFER_START, "Downloading audio...");
        self.transfer(&yt_dlp, &options, url, reporter).await?;

        let file_path = self.locate(&info, output_dir).await?;
        debug!("Found audio file: {}", file_path.display());

        let mut metadata = info.to_result_metadata();
        if self.verify {
            reporter.report(95.0, "Verifying audio...");
            self.verify_audio(&file_path, duration, &mut metadata).await;
        }

        reporter.report(100.0, "Download complete!");

        Ok(DownloadedAudio {
            file_path,
            title: info.title_or_unknown().to_string(),
            duration,
            metadata,
        })
    }

    /// Metadata-only query; no media bytes are fetched.
    async fn probe(
        &self,
        yt_dlp: &Path,
        options: &YtDlpOptions,
        url: &str,
    ) -> Result<Option<VideoInfo>, DownloadError> {
        debug!("Probing {}", url);

        let output = Command::new(yt_dlp)
            .args(options.common_args())
            .args(["--dump-single-json", "--skip-download"])
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(url, &stderr, output.status.code()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        VideoInfo::from_probe_output(&stdout).map_err(|e| DownloadError::InfoParse(e.to_string()))
    }

    /// Download and transcode, relaying progress lines as they arrive.
    async fn transfer(
        &self,
        yt_dlp: &Path,
        options: &YtDlpOptions,
        url: &str,
        reporter: Reporter<'_>,
    ) -> Result<(), DownloadError> {
        let mut cmd = Command::new(yt_dlp);
        cmd.args(options.to_args())
            .args(["--newline", "--progress-template", PROGRESS_TEMPLATE]);

        if let Some(ref ffmpeg) = self.ffmpeg_path {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }

        cmd.arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("yt-dlp command: {:?}", cmd.as_std());

        let mut child = cmd.spawn().map_err(spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::YtDlp("yt-dlp stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::YtDlp("yt-dlp stderr was not captured".to_string()))?;

        // Output is not guaranteed to be UTF-8 (titles in a legacy locale)
        let stderr_reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = BufReader::new(stderr).read_to_end(&mut buf).await {
                debug!("Reading yt-dlp stderr failed: {}", e);
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut stdout = BufReader::new(stdout);
        let mut line = Vec::new();
        while stdout.read_until(b'\n', &mut line).await? > 0 {
            reporter.relay_line(&String::from_utf8_lossy(&line));
            line.clear();
        }

        let status = child.wait().await?;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(url, &stderr, status.code()));
        }

        Ok(())
    }

    /// Find the transcoded file: predicted name first, newest matching file second.
    async fn locate(&self, info: &VideoInfo, output_dir: &Path) -> Result<PathBuf, DownloadError> {
        let ext = self.config.format.extension();

        let expected = match info.filename {
            Some(ref predicted) => predicted.with_extension(ext),
            None => output_dir.join(format!(
                "{}.{}",
                info.render_template(&self.config.filename_template),
                ext
            )),
        };

        if tokio::fs::try_exists(&expected).await? {
            return Ok(expected);
        }

        debug!(
            "Expected {} not found, falling back to newest .{} file",
            expected.display(),
            ext
        );

        newest_with_extension(output_dir, ext)
            .await?
            .ok_or(DownloadError::FileNotFound)
    }

    async fn verify_audio(&self, path: &Path, expected_duration: f64, metadata: &mut Metadata) {
        let inspector = match self.ffmpeg_path {
            Some(ref ffmpeg) => AudioInspector::new(ffmpeg.clone()),
            None => match AudioInspector::from_path() {
                Ok(inspector) => inspector,
                Err(e) => {
                    debug!("Skipping verification: {}", e);
                    return;
                }
            },
        };

        let audio = match inspector.inspect(path).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Could not verify {}: {}", path.display(), e);
                return;
            }
        };

        if let Some(rate) = self.config.target_sample_rate() {
            if audio.sample_rate != rate {
                warn!(
                    "{} has {} Hz, expected {} Hz",
                    path.display(),
                    audio.sample_rate,
                    rate
                );
            }
        }
        match audio.channels {
            Some(channels) if self.config.mono && channels != 1 => {
                warn!("{} has {} channels, expected mono", path.display(), channels);
            }
            None => debug!("Unrecognised channel layout in {}", path.display()),
            _ => {}
        }
        if audio.duration_differs(expected_duration, DURATION_TOLERANCE) {
            warn!(
                "{} is {:.1}s long, expected {:.1}s",
                path.display(),
                audio.duration.unwrap_or_default(),
                expected_duration
            );
        }

        metadata.insert("audio_sample_rate".to_string(), Value::from(audio.sample_rate));
        if let Some(channels) = audio.channels {
            metadata.insert("audio_channels".to_string(), Value::from(channels));
        }
    }
}

#[async_trait]
impl AudioSource for YouTubeDownloader {
    fn source_name(&self) -> &str {
        "YouTube"
    }

    fn validate_url(&self, url: &str) -> bool {
        validate_youtube_url(url)
    }

    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        progress: Option<&ProgressFn<'_>>,
    ) -> DownloadResult {
        info!("Downloading audio from: {}", url);

        match self.run(url, output_dir, Reporter::new(progress)).await {
            Ok(audio) => {
                info!("Downloaded: {} -> {}", audio.title, audio.file_path.display());
                DownloadResult::success(url, audio)
            }
            Err(e) => {
                warn!("Download of {} failed: {}", url, e);
                DownloadResult::failure(url, e.kind(), e.to_string())
            }
        }
    }
}

fn spawn_error(e: std::io::Error) -> DownloadError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DownloadError::YtDlpNotFound
    } else {
        DownloadError::Io(e)
    }
}

/// Turn a failed yt-dlp run into an error, preferring its last `ERROR:` line.
fn classify_failure(url: &str, stderr: &str, code: Option<i32>) -> DownloadError {
    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        return DownloadError::VideoUnavailable(url.to_string());
    }

    let message = stderr
        .lines()
        .rev()
        .find_map(|l| l.trim().strip_prefix("ERROR:"))
        .map(|l| l.trim().to_string())
        .or_else(|| {
            let trimmed = stderr.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("yt-dlp failed with exit code: {:?}", code));

    DownloadError::YtDlp(message)
}

async fn newest_with_extension(dir: &Path, ext: &str) -> Result<Option<PathBuf>, DownloadError> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case(ext));
        if !matches {
            continue;
        }

        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }

        let modified = meta.modified()?;
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}
