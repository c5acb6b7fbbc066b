//! Job control -- cancel, prune and registry inspection.

use crate::error::{Error, Result};
use crate::types::{JobId, JobInfo};

use super::MediaDownloader;

impl MediaDownloader {
    /// Request cancellation of a job
    ///
    /// Cancellation is cooperative: the job observes the request at its next
    /// check point and ends in `Cancelled`. Cancelling a job that already reached
    /// a terminal state, or cancelling twice, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JobNotFound`] if no job with this id is registered.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use media_dl::*;
    /// # async fn example(downloader: MediaDownloader, id: JobId) -> Result<()> {
    /// downloader.cancel(id).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn cancel(&self, id: JobId) -> Result<()> {
        let jobs = self.registry.jobs.lock().await;
        let entry = jobs.get(&id).ok_or(Error::JobNotFound(id.0))?;

        let state = entry.handle.state();
        if state.is_terminal() {
            tracing::debug!(job_id = id.0, state = %state, "Cancel ignored, job already finished");
            return Ok(());
        }

        if !entry.handle.cancel_token.is_cancelled() {
            tracing::info!(job_id = id.0, state = %state, "Cancellation requested");
            entry.handle.cancel_token.cancel();
        }
        Ok(())
    }

    /// Remove finished jobs from the registry
    ///
    /// Only jobs in a terminal state whose task has exited are removed. Returns
    /// the ids that were removed, in ascending order.
    pub async fn prune(&self) -> Vec<JobId> {
        let mut jobs = self.registry.jobs.lock().await;

        let mut removed: Vec<JobId> = jobs
            .iter()
            .filter(|(_, entry)| entry.handle.state().is_terminal() && entry.task.is_finished())
            .map(|(id, _)| *id)
            .collect();
        for id in &removed {
            jobs.remove(id);
        }
        removed.sort();

        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "Pruned finished jobs");
        }
        removed
    }

    /// Snapshot of one job
    pub async fn job(&self, id: JobId) -> Option<JobInfo> {
        let jobs = self.registry.jobs.lock().await;
        jobs.get(&id).map(|entry| entry.handle.info())
    }

    /// Snapshot of all registered jobs, ordered by id
    pub async fn jobs(&self) -> Vec<JobInfo> {
        let jobs = self.registry.jobs.lock().await;
        let mut infos: Vec<JobInfo> = jobs.values().map(|entry| entry.handle.info()).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }
}
