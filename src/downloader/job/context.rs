//! Job task context -- everything one job needs, captured at submission.

use crate::db::Database;
use crate::extractor::{DownloadPlan, ExtractionAdapter, ProgressReporter};
use crate::types::{Event, JobId};
use std::ops::ControlFlow;
use std::sync::Arc;

use super::{JobHandle, Phase};

/// Shared context for a single job task, reducing parameter passing between helpers.
pub(crate) struct JobContext {
    pub(crate) handle: Arc<JobHandle>,
    pub(crate) plan: DownloadPlan,
    pub(crate) adapter: Arc<dyn ExtractionAdapter>,
    pub(crate) db: Arc<Database>,
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl JobContext {
    pub(super) fn id(&self) -> JobId {
        self.handle.id
    }

    pub(super) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Reporter that publishes progress and stops the adapter once cancelled
    pub(super) fn progress_reporter(&self) -> ProgressReporter {
        let handle = Arc::clone(&self.handle);
        let event_tx = self.event_tx.clone();

        ProgressReporter::new(move |update| {
            if handle.is_cancelled() {
                return ControlFlow::Break(());
            }
            let percent = handle.record_progress(&update);
            event_tx
                .send(Event::Progress {
                    id: handle.id,
                    percent,
                    rate: update.rate,
                })
                .ok();
            ControlFlow::Continue(())
        })
    }

    /// Record the cancellation and emit the terminal event
    pub(super) fn mark_cancelled(&self) {
        if self.handle.transition(Phase::Cancelled) {
            tracing::info!(job_id = self.id().0, "Job cancelled");
            self.emit(Event::Cancelled { id: self.id() });
        }
    }

    /// Record the failure and emit the terminal event
    pub(super) fn mark_failed(&self, error: String) {
        tracing::error!(job_id = self.id().0, url = %self.handle.url, error = %error, "Job failed");
        if self.handle.transition(Phase::Failed(error.clone())) {
            self.emit(Event::Failed {
                id: self.id(),
                error,
            });
        }
    }
}
