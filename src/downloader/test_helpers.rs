//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::bootstrap::DependencyBootstrapper;
use crate::config::Config;
use crate::db::Database;
use crate::downloader::{JobRegistry, MediaDownloader};
use crate::error::ExtractionError;
use crate::extractor::{
    DownloadPlan, ExtractionAdapter, MediaMetadata, ProgressReporter, ProgressUpdate,
};
use crate::settings::SettingsStore;
use crate::types::{Event, JobId, JobOptions, OutputMode};
use crate::utils::sanitize_filename;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

/// Scripted extraction adapter
///
/// Resolves a fixed title, then replays `steps` as progress updates with
/// `step_delay` between them, then writes a small output file.
pub(crate) struct MockAdapter {
    pub(crate) title: String,
    pub(crate) size_hint: Option<u64>,
    pub(crate) steps: Vec<ProgressUpdate>,
    pub(crate) step_delay: Duration,
    pub(crate) metadata_error: Option<ExtractionError>,
    pub(crate) download_error: Option<ExtractionError>,
    pub(crate) panic_in_download: bool,
    pub(crate) downloads_started: AtomicUsize,
}

impl MockAdapter {
    pub(crate) fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            size_hint: Some(10 * 1024 * 1024),
            steps: vec![
                update(0, Some(1000)),
                update(500, Some(1000)),
                update(1000, Some(1000)),
            ],
            step_delay: Duration::ZERO,
            metadata_error: None,
            download_error: None,
            panic_in_download: false,
            downloads_started: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_steps(mut self, steps: Vec<ProgressUpdate>) -> Self {
        self.steps = steps;
        self
    }

    /// Spread `count` updates over `count * delay`
    pub(crate) fn slow(mut self, count: u64, delay: Duration) -> Self {
        self.steps = (0..count).map(|i| update(i, Some(count))).collect();
        self.step_delay = delay;
        self
    }

    pub(crate) fn failing_metadata(mut self, error: ExtractionError) -> Self {
        self.metadata_error = Some(error);
        self
    }

    pub(crate) fn failing_download(mut self, error: ExtractionError) -> Self {
        self.download_error = Some(error);
        self
    }

    /// Panic after the first progress update, like a buggy third-party adapter
    pub(crate) fn panicking(mut self) -> Self {
        self.panic_in_download = true;
        self
    }
}

pub(crate) fn update(downloaded: u64, total: Option<u64>) -> ProgressUpdate {
    ProgressUpdate {
        downloaded_bytes: downloaded,
        total_bytes: total,
        rate: Some("1.00MiB/s".to_string()),
    }
}

#[async_trait]
impl ExtractionAdapter for MockAdapter {
    async fn resolve_metadata(
        &self,
        _url: &str,
        plan: &DownloadPlan,
    ) -> Result<MediaMetadata, ExtractionError> {
        if let Some(err) = &self.metadata_error {
            return Err(err.clone());
        }
        Ok(MediaMetadata {
            title: self.title.clone(),
            size_hint: self.size_hint,
            filename: Some(plan.output_dir.join(format!("{}.webm", self.title))),
        })
    }

    async fn download(
        &self,
        _url: &str,
        plan: &DownloadPlan,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf, ExtractionError> {
        self.downloads_started.fetch_add(1, Ordering::SeqCst);

        for step in &self.steps {
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            if reporter.report(step.clone()).is_break() {
                return Err(ExtractionError::Aborted);
            }
            if self.panic_in_download {
                panic!("decoder state corrupted");
            }
        }

        if let Some(err) = &self.download_error {
            return Err(err.clone());
        }

        // Pre-conversion names, like the real tool reports them
        let name = match plan.mode {
            OutputMode::Thumbnail => format!("{}.webp", sanitize_filename(&self.title)),
            OutputMode::AudioOnly => format!("{}.webm", self.title),
            OutputMode::VideoAudio => format!("{}.mp4", self.title),
        };
        let path = plan.output_dir.join(name);
        tokio::fs::create_dir_all(&plan.output_dir)
            .await
            .map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;
        tokio::fs::write(&path, b"media")
            .await
            .map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;
        Ok(path)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a test MediaDownloader instance backed by `adapter`.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader_with(
    adapter: Arc<dyn ExtractionAdapter>,
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("history.db");
    config.persistence.settings_path = temp_dir.path().join("settings.json");
    config.dependency.install_dir = temp_dir.path().join("bin");
    config.dependency.required = false;
    config.shutdown_timeout = Duration::from_secs(5);

    std::fs::write(
        &config.persistence.settings_path,
        serde_json::json!({ "download_path": temp_dir.path().join("downloads") }).to_string(),
    )
    .unwrap();

    let settings = SettingsStore::open(&config.persistence.settings_path).await;
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_capacity);
    let bootstrapper = DependencyBootstrapper::new(config.dependency.clone());

    let downloader = MediaDownloader {
        db: Arc::new(db),
        settings: Arc::new(settings),
        event_tx,
        config: Arc::new(config),
        adapter,
        bootstrapper: Arc::new(bootstrapper),
        registry: JobRegistry::new(),
    };

    (downloader, temp_dir)
}

/// Helper with a default scripted adapter
pub(crate) async fn create_test_downloader() -> (MediaDownloader, tempfile::TempDir) {
    create_test_downloader_with(Arc::new(MockAdapter::new("Test Clip"))).await
}

/// Options writing into the test download directory
pub(crate) fn test_options(dir: &tempfile::TempDir, mode: OutputMode) -> JobOptions {
    JobOptions::new(dir.path().join("downloads")).with_mode(mode)
}

/// Collect events for `id` until its terminal event arrives
pub(crate) async fn events_until_terminal(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    id: JobId,
) -> Vec<Event> {
    let mut events = Vec::new();
    let collect = async {
        loop {
            match rx.recv().await {
                Ok(event) if event.job_id() == Some(id) => {
                    let terminal = event.is_terminal();
                    events.push(event);
                    if terminal {
                        break;
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), collect)
        .await
        .expect("job did not finish in time");
    events
}
