//! End-to-end download behaviour against a scripted yt-dlp stand-in.
#![cfg(unix)]

use speechfetch_core::{
    AudioFormat, AudioSource, DownloadConfig, FailureKind, YouTubeDownloader,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

const URL: &str = "https://www.youtube.com/watch?v=jNQXAC9IVRw";

// Writing an executable while another test forks can leave it busy (ETXTBSY).
static SERIAL: Mutex<()> = Mutex::new(());

enum Probe {
    Info { duration: u32 },
    Null,
    Fail,
}

enum Transfer {
    /// Write the file where the probe said it would be
    Exact,
    /// Write the file under a different name
    Renamed,
    /// Exit successfully without writing anything
    Nothing,
    /// Print Latin-1 bytes on both streams, then write the file
    Latin1Output,
    Fail,
}

const SCRIPT: &str = r#"#!/bin/sh
out=""
probe=0
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  if [ "$arg" = "--dump-single-json" ]; then probe=1; fi
  prev="$arg"
done
base=$(printf '%s' "$out" | sed -e 's/%(title)s/Me at the zoo/g' -e 's/%(id)s/jNQXAC9IVRw/g' -e 's/%(uploader)s/jawed/g' -e 's/\.%(ext)s$//')
dir=$(dirname "$out")
if [ "$probe" = 1 ]; then
@PROBE@
  exit 0
fi
echo "[youtube] jNQXAC9IVRw: Downloading webpage"
@TRANSFER@
"#;

fn probe_body(probe: &Probe) -> String {
    match probe {
        Probe::Info { duration } => format!(
            "cat <<EOF\n{{\"id\": \"jNQXAC9IVRw\", \"title\": \"Me at the zoo\", \"uploader\": \"jawed\", \"upload_date\": \"20050424\", \"duration\": {}, \"view_count\": 42, \"description\": \"The first video\", \"_filename\": \"$base.webm\"}}\nEOF",
            duration
        ),
        Probe::Null => "echo null".to_string(),
        Probe::Fail => {
            "echo 'ERROR: [youtube] jNQXAC9IVRw: Private video. Sign in if you have access' >&2\n  exit 1"
                .to_string()
        }
    }
}

fn transfer_body(transfer: &Transfer, ext: &str) -> String {
    let progress = "echo 'speechfetch-progress|downloading|0|1000|NA|NA'\n\
                    echo 'speechfetch-progress|downloading|500|1000|NA|1048576'\n\
                    echo 'speechfetch-progress|downloading|1000|1000|NA|1048576'\n\
                    echo 'speechfetch-progress|finished|1000|1000|NA|NA'";
    match transfer {
        Transfer::Exact => format!("{}\nprintf 'RIFF' > \"$base.{}\"", progress, ext),
        Transfer::Renamed => format!("{}\nprintf 'RIFF' > \"$dir/renamed.{}\"", progress, ext),
        Transfer::Nothing => progress.to_string(),
        Transfer::Latin1Output => format!(
            "printf '[download] Destination: caf\\351.webm\\n'\n\
             printf 'WARNING: caf\\351 has no subtitles\\n' >&2\n\
             {}\nprintf 'RIFF' > \"$base.{}\"",
            progress, ext
        ),
        Transfer::Fail => {
            "echo 'ERROR: unable to download video data: HTTP Error 403: Forbidden' >&2\nexit 1"
                .to_string()
        }
    }
}

fn fake_yt_dlp(dir: &Path, probe: Probe, transfer: Transfer, ext: &str) -> PathBuf {
    let script = SCRIPT
        .replace("@PROBE@", &probe_body(&probe))
        .replace("@TRANSFER@", &transfer_body(&transfer, ext));
    let path = dir.join("yt-dlp");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Fixture {
    _tools: TempDir,
    output: TempDir,
    downloader: YouTubeDownloader,
}

fn fixture(config: DownloadConfig, probe: Probe, transfer: Transfer) -> Fixture {
    let tools = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let yt_dlp = fake_yt_dlp(tools.path(), probe, transfer, config.format.extension());
    let downloader = YouTubeDownloader::new(config)
        .with_yt_dlp_path(yt_dlp)
        .with_verification(false);
    Fixture {
        _tools: tools,
        output,
        downloader,
    }
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[tokio::test]
async fn test_successful_download() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(
        DownloadConfig::transcription(),
        Probe::Info { duration: 19 },
        Transfer::Exact,
    );

    let seen = Mutex::new(Vec::new());
    let callback = |p: f64, s: &str| seen.lock().unwrap().push((p, s.to_string()));

    let result = fx
        .downloader
        .download(URL, fx.output.path(), Some(&callback))
        .await;

    assert!(result.is_success(), "{:?}", result.error_message());
    assert_eq!(result.error_message(), None);
    assert_eq!(result.title(), Some("Me at the zoo"));
    assert_eq!(result.duration(), Some(19.0));
    assert_eq!(result.source_url(), URL);

    let path = result.file_path().unwrap();
    assert!(path.exists());
    assert_eq!(path.extension().unwrap(), "wav");
    assert!(path.starts_with(fx.output.path()));
    assert_eq!(path.file_name().unwrap(), "Me at the zoo.wav");

    let metadata = result.metadata().unwrap();
    assert_eq!(metadata["uploader"], "jawed");
    assert_eq!(metadata["video_id"], "jNQXAC9IVRw");
    assert_eq!(metadata["view_count"], 42);

    let seen = seen.into_inner().unwrap();
    let percents: Vec<f64> = seen.iter().map(|(p, _)| *p).collect();
    assert_eq!(percents.first(), Some(&0.0));
    assert_eq!(percents.last(), Some(&100.0));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert!(percents.contains(&47.5));
    assert!(seen.iter().any(|(p, s)| *p == 90.0 && s == "Converting audio..."));
    assert!(seen.iter().any(|(_, s)| s == "Downloading... 1.0 MB/s"));
}

#[tokio::test]
async fn test_duration_limit_rejects_before_transfer() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let config = DownloadConfig {
        max_duration: Some(1.0),
        ..DownloadConfig::transcription()
    };
    let fx = fixture(config, Probe::Info { duration: 19 }, Transfer::Exact);

    let result = fx.downloader.download(URL, fx.output.path(), None).await;

    assert!(!result.is_success());
    assert_eq!(result.failure_kind(), Some(FailureKind::DurationExceeded));
    let message = result.error_message().unwrap();
    assert!(message.contains("19"), "{}", message);
    assert!(message.contains("1s"), "{}", message);
    assert!(result.file_path().is_none());
    assert!(files_in(fx.output.path()).is_empty());
}

#[tokio::test]
async fn test_probe_without_info() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(DownloadConfig::default(), Probe::Null, Transfer::Exact);

    let result = fx.downloader.download(URL, fx.output.path(), None).await;

    assert_eq!(result.failure_kind(), Some(FailureKind::ExtractionFailed));
    assert_eq!(result.error_message(), Some("Failed to extract video info"));
    assert!(files_in(fx.output.path()).is_empty());
}

#[tokio::test]
async fn test_probe_error_is_transfer_failure() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(DownloadConfig::default(), Probe::Fail, Transfer::Exact);

    let result = fx.downloader.download(URL, fx.output.path(), None).await;

    assert_eq!(result.failure_kind(), Some(FailureKind::TransferFailed));
    assert!(result.error_message().unwrap().starts_with("Download error:"));
}

#[tokio::test]
async fn test_transfer_error_is_reported() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(
        DownloadConfig::default(),
        Probe::Info { duration: 19 },
        Transfer::Fail,
    );

    let result = fx.downloader.download(URL, fx.output.path(), None).await;

    assert_eq!(result.failure_kind(), Some(FailureKind::TransferFailed));
    assert_eq!(
        result.error_message(),
        Some("Download error: unable to download video data: HTTP Error 403: Forbidden")
    );
}

#[tokio::test]
async fn test_falls_back_to_newest_matching_file() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let config = DownloadConfig {
        format: AudioFormat::Mp3,
        ..DownloadConfig::compact()
    };
    let fx = fixture(config, Probe::Info { duration: 19 }, Transfer::Renamed);

    let result = fx.downloader.download(URL, fx.output.path(), None).await;

    assert!(result.is_success(), "{:?}", result.error_message());
    assert_eq!(result.file_path(), Some(fx.output.path().join("renamed.mp3").as_path()));
}

#[tokio::test]
async fn test_missing_output_file() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(
        DownloadConfig::default(),
        Probe::Info { duration: 19 },
        Transfer::Nothing,
    );

    let result = fx.downloader.download(URL, fx.output.path(), None).await;

    assert_eq!(result.failure_kind(), Some(FailureKind::FileNotFound));
    assert_eq!(result.error_message(), Some("Downloaded file not found"));
}

#[tokio::test]
async fn test_creates_nested_output_dir() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(
        DownloadConfig::default(),
        Probe::Info { duration: 19 },
        Transfer::Exact,
    );
    let nested = fx.output.path().join("a/b/c");

    let result = fx.downloader.download(URL, &nested, None).await;

    assert!(result.is_success(), "{:?}", result.error_message());
    assert!(result.file_path().unwrap().starts_with(&nested));
}

#[tokio::test]
async fn test_usable_as_trait_object() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(
        DownloadConfig::default(),
        Probe::Info { duration: 19 },
        Transfer::Exact,
    );
    let source: Box<dyn AudioSource> = Box::new(fx.downloader.clone());

    assert_eq!(source.source_name(), "YouTube");
    assert!(!source.validate_url("https://vimeo.com/123456"));

    let result = source.download(URL, fx.output.path(), None).await;
    assert!(result.is_success(), "{:?}", result.error_message());
}

#[tokio::test]
async fn test_non_utf8_output_does_not_abort() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fx = fixture(
        DownloadConfig::transcription(),
        Probe::Info { duration: 19 },
        Transfer::Latin1Output,
    );

    let seen = Mutex::new(Vec::new());
    let callback = |p: f64, _: &str| seen.lock().unwrap().push(p);

    let result = fx
        .downloader
        .download(URL, fx.output.path(), Some(&callback))
        .await;

    assert!(result.is_success(), "{:?}", result.error_message());
    assert_eq!(result.file_path().unwrap().file_name().unwrap(), "Me at the zoo.wav");
    let seen = seen.into_inner().unwrap();
    assert!(seen.contains(&47.5), "{:?}", seen);
    assert_eq!(seen.last(), Some(&100.0));
}
