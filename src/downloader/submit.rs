//! Job submission -- id allocation, admission checks, task spawning.

use crate::error::{Error, Result};
use crate::extractor::DownloadPlan;
use crate::types::{Event, JobId, JobOptions};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::job::{JobContext, JobHandle, run_job};
use super::{JobEntry, MediaDownloader};

/// Process-wide job id counter; ids are never reused while the process lives
static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn allocate_job_id() -> JobId {
    JobId(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
}

/// Accept only absolute http(s) URLs
fn validate_url(url: &str) -> Result<()> {
    let parsed =
        reqwest::Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        scheme => Err(Error::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            url, scheme
        ))),
    }
}

impl MediaDownloader {
    /// Submit a URL for download
    ///
    /// Registers a new job in `Pending` state, emits [`Event::Queued`] and starts
    /// the job's task. The options are captured as an immutable snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has begun
    /// - [`Error::InvalidUrl`] if `url` is not an absolute http(s) URL
    /// - [`Error::DependencyMissing`] if the media-processing binary is required
    ///   but not installed
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use media_dl::{MediaDownloader, OutputMode};
    /// # async fn example(downloader: MediaDownloader) -> media_dl::Result<()> {
    /// let options = downloader.job_options(OutputMode::AudioOnly).await;
    /// let id = downloader.submit("https://youtu.be/dQw4w9WgXcQ", options).await?;
    /// println!("queued job {id}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, url: impl Into<String>, options: JobOptions) -> Result<JobId> {
        if !self.registry.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = url.into().trim().to_string();
        validate_url(&url)?;

        let installed = self.bootstrapper.is_installed();
        if self.config.dependency.required && !installed {
            return Err(Error::DependencyMissing(self.config.dependency_binary()));
        }

        let mut plan = DownloadPlan::from_options(&options, &self.config.extractor);
        if installed {
            plan = plan.with_processor_location(self.config.dependency_binary());
        }

        let id = allocate_job_id();
        let handle = Arc::new(JobHandle::new(id, url.clone(), Arc::new(options)));

        let ctx = JobContext {
            handle: Arc::clone(&handle),
            plan,
            adapter: Arc::clone(&self.adapter),
            db: Arc::clone(&self.db),
            event_tx: self.event_tx.clone(),
        };

        let mut jobs = self.registry.jobs.lock().await;
        // shutdown() cancels under this lock; a job registered after it ran would be missed
        if !self.registry.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        // Queued goes out before the task exists so it always precedes Started
        self.emit_event(Event::Queued {
            id,
            url: url.clone(),
        });
        let task = tokio::spawn(run_job(ctx));
        jobs.insert(id, JobEntry { handle, task });
        drop(jobs);

        tracing::info!(job_id = id.0, url = %url, "Job queued");
        Ok(id)
    }
}
