//! Contract every audio acquisition backend implements

use crate::result::DownloadResult;
use async_trait::async_trait;
use std::path::Path;

/// Progress callback: percentage in `[0, 100]` and a human readable status.
pub type ProgressFn<'a> = dyn Fn(f64, &str) + Send + Sync + 'a;

/// An audio acquisition backend (YouTube, local files, ...).
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Human readable backend name, e.g. "YouTube"
    fn source_name(&self) -> &str;

    /// Whether `url` plausibly addresses this source. Never touches the network.
    fn validate_url(&self, url: &str) -> bool;

    /// Download audio from `url` into `output_dir`.
    ///
    /// Failures are reported through the returned [`DownloadResult`], never as
    /// a panic. `progress`, when given, may be called any number of times
    /// during this call and is not retained afterwards.
    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        progress: Option<&ProgressFn<'_>>,
    ) -> DownloadResult;
}
