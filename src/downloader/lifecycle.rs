//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;

use super::MediaDownloader;

impl MediaDownloader {
    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs
    /// 2. Requests cancellation of every job that has not finished
    /// 3. Waits for job tasks to exit, bounded by `config.shutdown_timeout`
    /// 4. Flushes settings and closes the history database
    ///
    /// Steps keep going even if an earlier one fails; failures are logged.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.registry.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        self.cancel_all().await;

        let wait_result =
            tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_running_jobs()).await;
        match wait_result {
            Ok(()) => tracing::info!("All jobs stopped"),
            Err(_) => {
                tracing::warn!("Timeout waiting for jobs to stop, proceeding with shutdown")
            }
        }

        if let Err(e) = self.settings.flush().await {
            tracing::error!(error = %e, "Failed to save settings during shutdown");
        }

        self.emit_event(Event::Shutdown);

        self.db.pool().close().await;
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shutting_down(&self) -> bool {
        !self.registry.accepting_new.load(Ordering::SeqCst)
    }

    async fn cancel_all(&self) {
        let jobs = self.registry.jobs.lock().await;
        let mut signalled = 0usize;
        for (id, entry) in jobs.iter() {
            if !entry.handle.state().is_terminal() {
                tracing::debug!(job_id = id.0, "Signaling cancellation");
                entry.handle.cancel_token.cancel();
                signalled += 1;
            }
        }
        tracing::info!(signalled, "Signaled cancellation to unfinished jobs");
    }

    async fn wait_for_running_jobs(&self) {
        loop {
            let running = {
                let jobs = self.registry.jobs.lock().await;
                jobs.values().filter(|entry| !entry.task.is_finished()).count()
            };

            if running == 0 {
                return;
            }

            tracing::debug!(running, "Waiting for jobs to stop");
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }
}
