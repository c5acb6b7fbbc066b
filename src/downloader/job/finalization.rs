//! Job finalization -- resolve the output path, build the result, record history.

use crate::extractor::MediaMetadata;
use crate::types::{Event, JobResult, OutputMode};
use crate::utils::{detect_platform, format_size, sanitize_filename, timestamp_now};
use std::path::{Path, PathBuf};

use super::context::JobContext;
use super::Phase;

/// Final location of a job's output
///
/// The adapter reports the file it wrote before post-processing, so audio jobs
/// swap the extension for the converted one and thumbnail jobs are named after
/// the sanitized title.
pub(crate) fn resolve_output_path(
    mode: OutputMode,
    output_dir: &Path,
    title: &str,
    downloaded: &Path,
) -> PathBuf {
    match mode {
        OutputMode::Thumbnail => output_dir.join(format!("{}.jpg", sanitize_filename(title))),
        OutputMode::AudioOnly => downloaded.with_extension("mp3"),
        OutputMode::VideoAudio => downloaded.to_path_buf(),
    }
}

/// Complete the job: transition, append history, emit the terminal event.
pub(super) async fn finalize_job(ctx: &JobContext, metadata: MediaMetadata, downloaded: PathBuf) {
    let id = ctx.id();
    let path = resolve_output_path(ctx.plan.mode, &ctx.plan.output_dir, &metadata.title, &downloaded);

    let result = JobResult {
        title: metadata.title,
        platform: detect_platform(&ctx.handle.url).to_string(),
        size: format_size(metadata.size_hint.unwrap_or(0)),
        path,
        date: timestamp_now(),
    };

    if !ctx.handle.transition(Phase::Completed(result.clone())) {
        return;
    }

    if let Err(e) = ctx.db.add_history(&result).await {
        tracing::warn!(job_id = id.0, error = %e, "Failed to record history entry");
        ctx.emit(Event::PersistenceWarning {
            id,
            message: format!("failed to record history: {}", e),
        });
    }

    tracing::info!(
        job_id = id.0,
        title = %result.title,
        path = %result.path.display(),
        size = %result.size,
        "Job completed"
    );
    ctx.emit(Event::Completed { id, result });
}
