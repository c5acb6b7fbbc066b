//! Extraction adapters
//!
//! An [`ExtractionAdapter`] turns a URL plus a [`DownloadPlan`] into a file on disk.
//! The bundled [`YtDlpAdapter`] drives the `yt-dlp` executable; tests and embedders
//! can provide their own implementation.

use crate::error::ExtractionError;
use async_trait::async_trait;
use std::ops::ControlFlow;
use std::path::PathBuf;

mod plan;
mod ytdlp;

pub use plan::{DownloadPlan, PostProcessor};
pub use ytdlp::YtDlpAdapter;

/// Metadata resolved before the download starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Media title
    pub title: String,
    /// Expected size in bytes, if the source reports one
    pub size_hint: Option<u64>,
    /// File name the media would be written to, if known ahead of time
    pub filename: Option<PathBuf>,
}

/// Transfer progress reported by an adapter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Bytes received so far
    pub downloaded_bytes: u64,
    /// Total bytes, if known (exact or estimated)
    pub total_bytes: Option<u64>,
    /// Human-readable transfer rate
    pub rate: Option<String>,
}

type ReportFn = dyn Fn(ProgressUpdate) -> ControlFlow<()> + Send + Sync;

/// Progress sink handed to [`ExtractionAdapter::download`]
///
/// [`report`](Self::report) returns `ControlFlow::Break(())` once the job has been
/// cancelled. The adapter must then stop its work and return
/// [`ExtractionError::Aborted`].
pub struct ProgressReporter {
    report: Box<ReportFn>,
}

impl ProgressReporter {
    /// Create a reporter from a callback
    pub fn new<F>(report: F) -> Self
    where
        F: Fn(ProgressUpdate) -> ControlFlow<()> + Send + Sync + 'static,
    {
        Self {
            report: Box::new(report),
        }
    }

    /// A reporter that discards updates and never asks the adapter to stop
    pub fn noop() -> Self {
        Self::new(|_| ControlFlow::Continue(()))
    }

    /// Report progress; `Break` means stop
    pub fn report(&self, update: ProgressUpdate) -> ControlFlow<()> {
        (self.report)(update)
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter").finish_non_exhaustive()
    }
}

/// Pluggable media extraction backend
///
/// Implementations must be safe to share between concurrently running jobs.
///
/// # Examples
///
/// ```no_run
/// use media_dl::extractor::{DownloadPlan, ExtractionAdapter, ProgressReporter, YtDlpAdapter};
/// use media_dl::config::ExtractorConfig;
/// use media_dl::JobOptions;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractorConfig::default();
/// let adapter = YtDlpAdapter::from_config(&config)?;
/// let plan = DownloadPlan::from_options(&JobOptions::new("/tmp/media"), &config);
///
/// let meta = adapter.resolve_metadata("https://youtu.be/abc", &plan).await?;
/// let path = adapter
///     .download("https://youtu.be/abc", &plan, &ProgressReporter::noop())
///     .await?;
/// println!("{} -> {}", meta.title, path.display());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    /// Resolve title and size information without downloading
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unsupported or unreachable, or if the
    /// tool output cannot be interpreted.
    async fn resolve_metadata(
        &self,
        url: &str,
        plan: &DownloadPlan,
    ) -> Result<MediaMetadata, ExtractionError>;

    /// Download the media described by `plan`, reporting progress as it goes
    ///
    /// Returns the path of the file written, as far as the adapter knows it.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Aborted`] if `reporter` asked to stop, or
    /// another variant if the download itself failed.
    async fn download(
        &self,
        url: &str,
        plan: &DownloadPlan,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf, ExtractionError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
