//! Event-driven waiting helpers

use media_dl::{Event, JobId, JobResult};
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;

/// How a job ended, as observed on the event channel
#[derive(Debug)]
pub enum WaitResult {
    /// Job completed successfully
    Completed(JobResult),
    /// Job failed with error
    Failed(String),
    /// Job was cancelled
    Cancelled,
    /// Timeout waiting for a terminal event
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for `id` to reach a terminal state, collecting its events on the way
pub async fn wait_for_terminal(
    events: &mut Receiver<Event>,
    id: JobId,
    timeout: Duration,
) -> (WaitResult, Vec<Event>) {
    let mut seen = Vec::new();

    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if event.job_id() == Some(id) => {
                    seen.push(event.clone());
                    match event {
                        Event::Completed { result, .. } => return WaitResult::Completed(result),
                        Event::Failed { error, .. } => return WaitResult::Failed(error),
                        Event::Cancelled { .. } => return WaitResult::Cancelled,
                        _ => continue,
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    (result.unwrap_or(WaitResult::Timeout), seen)
}

/// Wait until `id` reports its first progress update
pub async fn wait_for_progress(
    events: &mut Receiver<Event>,
    id: JobId,
    timeout: Duration,
) -> bool {
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::Progress { id: event_id, .. }) if event_id == id => return true,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return false,
            }
        }
    })
    .await
    .unwrap_or(false)
}
