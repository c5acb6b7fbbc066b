//! # media-dl
//!
//! Backend library for media download applications: submit a page URL, get the
//! audio, video or cover image it points to.
//!
//! The crate has no UI. An embedding application owns a [`MediaDownloader`],
//! submits jobs, subscribes to [`Event`]s and renders them however it likes.
//!
//! - **Jobs** run concurrently, each on its own task, with cooperative cancellation
//! - **Extraction** is delegated to an [`extractor::ExtractionAdapter`]; the bundled
//!   [`extractor::YtDlpAdapter`] drives the `yt-dlp` executable
//! - **Dependencies** such as the media-processing binary are installed on first use
//!   by the [`DependencyBootstrapper`]
//! - **Persistence** covers user settings ([`SettingsStore`]) and a history ledger of
//!   completed downloads ([`Database`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::extractor::YtDlpAdapter;
//! use media_dl::{Config, Event, MediaDownloader, OutputMode};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let adapter = Arc::new(YtDlpAdapter::from_config(&config.extractor)?);
//!     let downloader = MediaDownloader::new(config, adapter).await?;
//!
//!     // Install the processing binary before the first job
//!     downloader
//!         .bootstrapper()
//!         .ensure_installed(|pct| println!("{pct}%"), |status| println!("{status}"))
//!         .await?;
//!
//!     let mut events = downloader.subscribe();
//!     let options = downloader.job_options(OutputMode::AudioOnly).await;
//!     let id = downloader.submit("https://youtu.be/dQw4w9WgXcQ", options).await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!         if event.job_id() == Some(id) && event.is_terminal() {
//!             break;
//!         }
//!     }
//!
//!     downloader.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Dependency bootstrap (download, unpack, install)
pub mod bootstrap;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Extraction adapters
pub mod extractor;
/// User settings
pub mod settings;
/// Core types and events
pub mod types;
/// Release feed checks
pub mod updater;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use bootstrap::{DependencyBootstrapper, InstallReport};
pub use config::{Config, DependencyConfig, ExtractorConfig, PersistenceConfig, UpdateConfig};
pub use db::Database;
pub use downloader::MediaDownloader;
pub use error::{
    BootstrapError, DatabaseError, Error, ExtractionError, PersistenceError, Result,
};
pub use settings::{Settings, SettingsStore};
pub use types::{
    Event, HistoryEntry, JobId, JobInfo, JobOptions, JobResult, JobState, OutputMode, Progress,
    Resolution,
};
pub use updater::{UpdateChecker, UpdateStatus};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal, then cancels all jobs through the downloader's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, MediaDownloader, run_with_shutdown};
/// use media_dl::extractor::YtDlpAdapter;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let adapter = Arc::new(YtDlpAdapter::from_config(&config.extractor)?);
///     let downloader = MediaDownloader::new(config, adapter).await?;
///
///     // Jobs keep running until SIGTERM/SIGINT, then shut down cleanly
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
