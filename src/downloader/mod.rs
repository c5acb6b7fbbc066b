//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`submit`] - Job creation and registration
//! - [`control`] - Cancellation, pruning and registry inspection
//! - [`lifecycle`] - Shutdown coordination
//! - [`job`] - Per-job task execution

mod control;
mod job;
mod lifecycle;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::bootstrap::DependencyBootstrapper;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::extractor::ExtractionAdapter;
use crate::settings::SettingsStore;
use crate::types::{Event, JobId, JobOptions, OutputMode};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub(crate) use job::JobHandle;

/// Registered job: its shared state plus the task driving it
pub(crate) struct JobEntry {
    pub(crate) handle: Arc<JobHandle>,
    pub(crate) task: tokio::task::JoinHandle<()>,
}

/// Job registry and admission state
#[derive(Clone)]
pub(crate) struct JobRegistry {
    /// All jobs not yet pruned, keyed by id
    pub(crate) jobs: Arc<tokio::sync::Mutex<HashMap<JobId, JobEntry>>>,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl JobRegistry {
    pub(crate) fn new() -> Self {
        Self {
            jobs: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// Owns the job registry and the event channel, and hands each job a snapshot of
/// everything it needs so jobs never touch shared mutable state besides their own.
#[derive(Clone)]
pub struct MediaDownloader {
    /// History ledger
    pub db: Arc<Database>,
    /// User settings
    pub(crate) settings: Arc<SettingsStore>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Static configuration
    pub(crate) config: Arc<Config>,
    /// Extraction backend shared by all jobs
    pub(crate) adapter: Arc<dyn ExtractionAdapter>,
    /// Media-processing binary installer
    pub(crate) bootstrapper: Arc<DependencyBootstrapper>,
    /// Job registry
    pub(crate) registry: JobRegistry,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// This initializes all core components:
    /// - Opens the settings store (creating the download directory)
    /// - Opens/creates the history database and runs migrations
    /// - Sets up the event broadcast channel
    /// - Builds the dependency bootstrapper
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{Config, MediaDownloader};
    /// use media_dl::extractor::YtDlpAdapter;
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Config::default();
    /// let adapter = Arc::new(YtDlpAdapter::from_config(&config.extractor)?);
    /// let downloader = MediaDownloader::new(config, adapter).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: Config, adapter: Arc<dyn ExtractionAdapter>) -> Result<Self> {
        let settings = SettingsStore::open(&config.persistence.settings_path).await;
        if let Some(warning) = settings.load_warning() {
            tracing::warn!(error = %warning, "Starting with default settings");
        }

        let db = Database::new(&config.persistence.database_path).await?;

        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_capacity.max(1));

        let bootstrapper = DependencyBootstrapper::new(config.dependency.clone());
        tracing::info!(
            adapter = adapter.name(),
            dependency = %config.dependency_binary().display(),
            dependency_installed = bootstrapper.is_installed(),
            "Media downloader initialized"
        );

        Ok(Self {
            db: Arc::new(db),
            settings: Arc::new(settings),
            event_tx,
            config: Arc::new(config),
            adapter,
            bootstrapper: Arc::new(bootstrapper),
            registry: JobRegistry::new(),
        })
    }

    /// Subscribe to job events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls behind by more than the configured capacity receives
    /// `RecvError::Lagged`; jobs are never slowed down by slow subscribers.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use media_dl::{Event, MediaDownloader};
    /// # async fn example(downloader: MediaDownloader) {
    /// let mut events = downloader.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         if let Event::Progress { id, percent, .. } = event {
    ///             println!("job {id}: {percent:?}");
    ///         }
    ///     }
    /// });
    /// # }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// User settings store
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Dependency bootstrapper for the media-processing binary
    pub fn bootstrapper(&self) -> &DependencyBootstrapper {
        &self.bootstrapper
    }

    /// Options for a new job built from the current settings
    pub async fn job_options(&self, mode: OutputMode) -> JobOptions {
        self.settings.get().await.job_options(mode)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
