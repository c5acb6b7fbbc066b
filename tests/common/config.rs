//! Downloader construction for integration tests

use media_dl::extractor::ExtractionAdapter;
use media_dl::{Config, MediaDownloader};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Config with every path inside `dir` and the dependency gate disabled
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.settings_path = dir.path().join("settings.json");
    config.persistence.database_path = dir.path().join("history.db");
    config.dependency.install_dir = dir.path().join("bin");
    config.dependency.required = false;
    config.shutdown_timeout = Duration::from_secs(5);

    // Keep the default download directory out of the real home directory
    std::fs::write(
        &config.persistence.settings_path,
        serde_json::json!({ "download_path": dir.path().join("downloads") }).to_string(),
    )
    .expect("failed to seed settings");

    config
}

/// Downloader over `adapter`, with its temp directory (keep it alive)
pub async fn create_downloader(
    adapter: Arc<dyn ExtractionAdapter>,
) -> (MediaDownloader, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = test_config(&dir);
    let downloader = MediaDownloader::new(config, adapter)
        .await
        .expect("failed to create downloader");
    (downloader, dir)
}
