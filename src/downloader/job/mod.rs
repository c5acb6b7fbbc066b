//! Job execution -- shared job state and the task that drives one job.
//!
//! Split into focused submodules:
//! - [`context`] - Per-task context, progress reporter wiring
//! - [`orchestration`] - Top-level job lifecycle
//! - [`finalization`] - Output path resolution, result and history

mod context;
mod finalization;
mod orchestration;


pub(crate) use context::JobContext;
pub(crate) use orchestration::run_job;

use crate::extractor::ProgressUpdate;
use crate::types::{JobId, JobInfo, JobOptions, JobResult, JobState, Progress};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

/// Lifecycle phase; terminal phases carry their outcome
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Phase {
    Pending,
    Running,
    Completed(JobResult),
    Failed(String),
    Cancelled,
}

impl Phase {
    fn state(&self) -> JobState {
        match self {
            Phase::Pending => JobState::Pending,
            Phase::Running => JobState::Running,
            Phase::Completed(_) => JobState::Completed,
            Phase::Failed(_) => JobState::Failed,
            Phase::Cancelled => JobState::Cancelled,
        }
    }

    fn can_become(&self, next: &Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Pending, Phase::Running)
                | (Phase::Pending, Phase::Cancelled)
                | (Phase::Running, Phase::Completed(_))
                | (Phase::Running, Phase::Failed(_))
                | (Phase::Running, Phase::Cancelled)
        )
    }
}

#[derive(Debug)]
struct JobStatus {
    phase: Phase,
    progress: Progress,
}

/// State of one job, shared between the registry and the job's task
///
/// Only the job's own task changes the phase; the orchestrator reads it and
/// requests cancellation through the token.
#[derive(Debug)]
pub(crate) struct JobHandle {
    pub(crate) id: JobId,
    pub(crate) url: String,
    pub(crate) options: Arc<JobOptions>,
    pub(crate) cancel_token: CancellationToken,
    status: RwLock<JobStatus>,
}

impl JobHandle {
    pub(crate) fn new(id: JobId, url: String, options: Arc<JobOptions>) -> Self {
        Self {
            id,
            url,
            options,
            cancel_token: CancellationToken::new(),
            status: RwLock::new(JobStatus {
                phase: Phase::Pending,
                progress: Progress::default(),
            }),
        }
    }

    pub(crate) fn state(&self) -> JobState {
        self.read(|s| s.phase.state())
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Move to `next` if the state machine allows it
    ///
    /// Returns `false` and leaves the phase untouched otherwise.
    pub(crate) fn transition(&self, next: Phase) -> bool {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        if !status.phase.can_become(&next) {
            tracing::warn!(
                job_id = self.id.0,
                from = %status.phase.state(),
                to = %next.state(),
                "Rejected job state transition"
            );
            return false;
        }
        status.phase = next;
        true
    }

    /// Fold a progress update into the job's last known progress
    ///
    /// Returns the percent to publish: `None` while the total is unknown,
    /// otherwise a value in `0..=100` that never goes below a previously
    /// published one.
    pub(crate) fn record_progress(&self, update: &ProgressUpdate) -> Option<f32> {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        let percent = percent_of(update).map(|p| match status.progress.percent {
            Some(last) => p.max(last),
            None => p,
        });

        if percent.is_some() {
            status.progress.percent = percent;
        }
        if update.rate.is_some() {
            status.progress.rate = update.rate.clone();
        }
        percent
    }

    pub(crate) fn info(&self) -> JobInfo {
        self.read(|s| {
            let (result, error) = match &s.phase {
                Phase::Completed(result) => (Some(result.clone()), None),
                Phase::Failed(error) => (None, Some(error.clone())),
                _ => (None, None),
            };
            JobInfo {
                id: self.id,
                url: self.url.clone(),
                options: (*self.options).clone(),
                state: s.phase.state(),
                progress: s.progress.clone(),
                result,
                error,
            }
        })
    }

    fn read<T>(&self, f: impl FnOnce(&JobStatus) -> T) -> T {
        let status = self.status.read().unwrap_or_else(|e| e.into_inner());
        f(&status)
    }
}

/// Percent complete for an update, clamped to `0..=100`
pub(crate) fn percent_of(update: &ProgressUpdate) -> Option<f32> {
    let total = update.total_bytes.filter(|t| *t > 0)?;
    let ratio = update.downloaded_bytes as f64 / total as f64;
    Some((ratio * 100.0).clamp(0.0, 100.0) as f32)
}
