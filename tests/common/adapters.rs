//! Extraction adapters for driving the orchestrator without network access

use async_trait::async_trait;
use media_dl::extractor::{
    DownloadPlan, ExtractionAdapter, MediaMetadata, ProgressReporter, ProgressUpdate,
};
use media_dl::{ExtractionError, OutputMode};
use std::path::PathBuf;
use std::time::Duration;

/// Adapter that replays a fixed number of progress steps and writes a file
pub struct ScriptedAdapter {
    pub title: String,
    pub total_bytes: u64,
    pub steps: u64,
    pub step_delay: Duration,
    pub fail_with: Option<ExtractionError>,
}

impl ScriptedAdapter {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            total_bytes: 4096,
            steps: 4,
            step_delay: Duration::ZERO,
            fail_with: None,
        }
    }

    pub fn slow(mut self, steps: u64, delay: Duration) -> Self {
        self.steps = steps;
        self.step_delay = delay;
        self
    }

    pub fn failing(mut self, error: ExtractionError) -> Self {
        self.fail_with = Some(error);
        self
    }
}

#[async_trait]
impl ExtractionAdapter for ScriptedAdapter {
    async fn resolve_metadata(
        &self,
        _url: &str,
        _plan: &DownloadPlan,
    ) -> Result<MediaMetadata, ExtractionError> {
        Ok(MediaMetadata {
            title: self.title.clone(),
            size_hint: Some(self.total_bytes),
            filename: None,
        })
    }

    async fn download(
        &self,
        _url: &str,
        plan: &DownloadPlan,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf, ExtractionError> {
        for step in 1..=self.steps {
            tokio::time::sleep(self.step_delay).await;
            let update = ProgressUpdate {
                downloaded_bytes: self.total_bytes * step / self.steps,
                total_bytes: Some(self.total_bytes),
                rate: Some("2.00MiB/s".to_string()),
            };
            if reporter.report(update).is_break() {
                return Err(ExtractionError::Aborted);
            }
        }

        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let ext = match plan.mode {
            OutputMode::VideoAudio => "mp4",
            OutputMode::AudioOnly => "m4a",
            OutputMode::Thumbnail => "webp",
        };
        tokio::fs::create_dir_all(&plan.output_dir)
            .await
            .map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;
        let path = plan.output_dir.join(format!("{}.{}", self.title, ext));
        tokio::fs::write(&path, b"media")
            .await
            .map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;
        Ok(path)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
