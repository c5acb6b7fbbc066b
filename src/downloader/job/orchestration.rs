//! Job orchestration -- top-level lifecycle for a single job.

use crate::error::ExtractionError;
use crate::types::Event;
use std::any::Any;
use std::sync::Arc;

use super::context::JobContext;
use super::finalization::finalize_job;
use super::Phase;

/// What to do after an adapter call failed
enum Interrupted {
    Cancelled,
    Failed(String),
}

fn interpret(ctx: &JobContext, error: ExtractionError) -> Interrupted {
    match error {
        ExtractionError::Aborted => Interrupted::Cancelled,
        // A tool killed mid-run reports an ordinary failure; cancellation wins
        _ if ctx.handle.is_cancelled() => Interrupted::Cancelled,
        other => Interrupted::Failed(other.to_string()),
    }
}

/// Job task entry point -- supervises [`drive_job`] on its own task.
///
/// A panicking adapter only takes down the inner task; the job is then marked
/// `Failed` so it still reaches a terminal state and can be pruned.
pub(crate) async fn run_job(ctx: JobContext) {
    let ctx = Arc::new(ctx);
    let inner = tokio::spawn(drive_job(Arc::clone(&ctx)));

    match inner.await {
        Ok(()) => {}
        Err(e) if e.is_panic() => {
            let message = panic_message(e.into_panic());
            ctx.mark_failed(format!("extraction adapter panicked: {}", message));
        }
        Err(e) => {
            tracing::warn!(job_id = ctx.id().0, error = %e, "Job task aborted");
            ctx.mark_cancelled();
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Core job task -- drives one job from Pending to a terminal state.
///
/// Phases:
/// 1. Honour a cancellation that arrived before the task ran
/// 2. Transition to Running
/// 3. Resolve metadata
/// 4. Download with a cancellation-aware progress reporter
/// 5. Finalize the result and record history
async fn drive_job(ctx: Arc<JobContext>) {
    let id = ctx.id();

    // Phase 1: cancelled while pending
    if ctx.handle.is_cancelled() {
        ctx.mark_cancelled();
        return;
    }

    // Phase 2: start
    if !ctx.handle.transition(Phase::Running) {
        return;
    }
    tracing::info!(
        job_id = id.0,
        url = %ctx.handle.url,
        mode = ?ctx.plan.mode,
        adapter = ctx.adapter.name(),
        "Job started"
    );
    ctx.emit(Event::Started { id });

    // Phase 3: metadata
    let metadata = match ctx.adapter.resolve_metadata(&ctx.handle.url, &ctx.plan).await {
        Ok(metadata) => metadata,
        Err(e) => {
            match interpret(&ctx, e) {
                Interrupted::Cancelled => ctx.mark_cancelled(),
                Interrupted::Failed(msg) => ctx.mark_failed(msg),
            }
            return;
        }
    };
    tracing::debug!(job_id = id.0, title = %metadata.title, size_hint = ?metadata.size_hint, "Metadata resolved");
    ctx.emit(Event::Log {
        id,
        message: format!("Found: {}", metadata.title),
    });

    if ctx.handle.is_cancelled() {
        ctx.mark_cancelled();
        return;
    }

    // Phase 4: download
    let reporter = ctx.progress_reporter();
    let downloaded = match ctx
        .adapter
        .download(&ctx.handle.url, &ctx.plan, &reporter)
        .await
    {
        Ok(path) => path,
        Err(e) => {
            match interpret(&ctx, e) {
                Interrupted::Cancelled => ctx.mark_cancelled(),
                Interrupted::Failed(msg) => ctx.mark_failed(msg),
            }
            return;
        }
    };

    // Cancelled after the adapter finished: the output stays where it is
    if ctx.handle.is_cancelled() {
        tracing::debug!(job_id = id.0, path = %downloaded.display(), "Cancelled after download, leaving output in place");
        ctx.mark_cancelled();
        return;
    }

    // Phase 5: result and history
    finalize_job(&ctx, metadata, downloaded).await;
}
