//! Relay of yt-dlp progress into the caller's callback

use crate::source::ProgressFn;

const LINE_PREFIX: &str = "speechfetch-progress|";

/// Progress template handed to yt-dlp; every progress update becomes one
/// machine readable stdout line starting with [`LINE_PREFIX`].
pub const PROGRESS_TEMPLATE: &str = "download:speechfetch-progress|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s";

/// Start of the byte transfer window.
pub const TRANSFER_START: f64 = 5.0;
/// End of the byte transfer window; the rest belongs to post-processing.
pub const TRANSFER_END: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Downloading,
    Finished,
    Other,
}

/// One progress update as printed through [`PROGRESS_TEMPLATE`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub status: TransferStatus,
    pub downloaded_bytes: Option<f64>,
    pub total_bytes: Option<f64>,
    pub total_bytes_estimate: Option<f64>,
    /// Bytes per second
    pub speed: Option<f64>,
}

impl ProgressEvent {
    /// Parse a stdout line. Lines that are not progress updates yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix(LINE_PREFIX)?;
        let mut fields = rest.split('|');

        let status = match fields.next()? {
            "downloading" => TransferStatus::Downloading,
            "finished" => TransferStatus::Finished,
            _ => TransferStatus::Other,
        };

        // yt-dlp prints "NA" for missing fields
        let mut number = || fields.next().and_then(|f| f.trim().parse::<f64>().ok());

        Some(Self {
            status,
            downloaded_bytes: number(),
            total_bytes: number(),
            total_bytes_estimate: number(),
            speed: number(),
        })
    }

    fn total(&self) -> Option<f64> {
        self.total_bytes
            .filter(|t| *t > 0.0)
            .or(self.total_bytes_estimate)
            .filter(|t| *t > 0.0)
    }

    /// Percentage and status to report, if this event is worth reporting.
    pub fn scaled(&self) -> Option<(f64, String)> {
        match self.status {
            TransferStatus::Downloading => {
                let total = self.total()?;
                let downloaded = self.downloaded_bytes.unwrap_or(0.0);
                let fraction = (downloaded / total).clamp(0.0, 1.0);
                let progress = TRANSFER_START + fraction * (TRANSFER_END - TRANSFER_START);
                Some((progress, format!("Downloading... {}", format_speed(self.speed))))
            }
            TransferStatus::Finished => Some((TRANSFER_END, "Converting audio...".to_string())),
            TransferStatus::Other => None,
        }
    }
}

/// `"1.5 MB/s"`, or `"..."` when the rate is unknown.
pub fn format_speed(speed: Option<f64>) -> String {
    match speed {
        Some(bps) if bps > 0.0 => format!("{:.1} MB/s", bps / 1024.0 / 1024.0),
        _ => "...".to_string(),
    }
}

/// Call-scoped wrapper around an optional progress callback.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    callback: Option<&'a ProgressFn<'a>>,
}

impl<'a> Reporter<'a> {
    pub fn new(callback: Option<&'a ProgressFn<'a>>) -> Self {
        Self { callback }
    }

    pub fn report(&self, progress: f64, status: &str) {
        if let Some(callback) = self.callback {
            callback(progress.clamp(0.0, 100.0), status);
        }
    }

    /// Forward a raw yt-dlp stdout line if it carries progress.
    pub fn relay_line(&self, line: &str) {
        if let Some((progress, status)) = ProgressEvent::parse(line).and_then(|e| e.scaled()) {
            self.report(progress, &status);
        }
    }
}
