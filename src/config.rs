//! Configuration types for media-dl
//!
//! [`Config`] is the static library configuration chosen by the embedding
//! application (file locations, dependency source, extractor tuning). User-facing
//! preferences that change at runtime live in [`crate::settings::SettingsStore`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where persisted state lives
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Settings document path (default: "./settings.json")
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// History ledger database path (default: "./history.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            database_path: default_database_path(),
        }
    }
}

/// External media-processing binary that must be installed before jobs run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Zip archive containing the binary
    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// File name of the binary inside the archive and on disk
    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Directory the binary is installed into (default: ".")
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Refuse job submission while the binary is missing
    ///
    /// Defaults to true on Windows only, where the default archive applies.
    /// Elsewhere the extractor uses the processing binary found on PATH.
    #[serde(default = "default_required")]
    pub required: bool,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            archive_url: default_archive_url(),
            binary_name: default_binary_name(),
            install_dir: default_install_dir(),
            required: default_required(),
        }
    }
}

impl DependencyConfig {
    /// Full path of the installed binary
    pub fn binary_path(&self) -> PathBuf {
        self.install_dir.join(&self.binary_name)
    }
}

/// Tuning passed through to the extraction tool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable (searched on PATH if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Retry count handed to the extractor (default: 30)
    ///
    /// This is the only retry policy in the system; jobs themselves never retry.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Parallel fragment downloads for segmented streams (default: 16)
    #[serde(default = "default_concurrent_fragments")]
    pub concurrent_fragments: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            retries: default_retries(),
            concurrent_fragments: default_concurrent_fragments(),
        }
    }
}

/// Release feed used by the update checker
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// URL returning the latest release as JSON
    #[serde(default = "default_release_api_url")]
    pub release_api_url: String,

    /// Version of the running application
    #[serde(default = "default_current_version")]
    pub current_version: String,

    /// Asset name suffix that identifies the installable package (default: ".exe")
    #[serde(default = "default_asset_suffix")]
    pub asset_suffix: String,

    /// Request timeout (default: 10s)
    #[serde(default = "default_update_timeout")]
    pub timeout: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            release_api_url: default_release_api_url(),
            current_version: default_current_version(),
            asset_suffix: default_asset_suffix(),
            timeout: default_update_timeout(),
        }
    }
}

/// Main configuration for MediaDownloader
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Settings and history locations
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Media-processing binary bootstrap
    #[serde(default)]
    pub dependency: DependencyConfig,

    /// Extraction tool tuning
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Update feed
    #[serde(default)]
    pub updates: UpdateConfig,

    /// Event channel capacity per subscriber (default: 1000)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// How long `shutdown()` waits for running jobs (default: 30s)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            persistence: PersistenceConfig::default(),
            dependency: DependencyConfig::default(),
            extractor: ExtractorConfig::default(),
            updates: UpdateConfig::default(),
            event_capacity: default_event_capacity(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Path of the bootstrapped media-processing binary
    pub fn dependency_binary(&self) -> PathBuf {
        self.dependency.binary_path()
    }
}

// Default value functions
fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.json")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("history.db")
}

fn default_archive_url() -> String {
    "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-win64-gpl.zip"
        .to_string()
}

fn default_binary_name() -> String {
    if cfg!(windows) {
        "ffmpeg.exe".to_string()
    } else {
        "ffmpeg".to_string()
    }
}

fn default_install_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_required() -> bool {
    cfg!(windows)
}

fn default_retries() -> u32 {
    30
}

fn default_concurrent_fragments() -> u32 {
    16
}

fn default_release_api_url() -> String {
    "https://api.github.com/repos/TopiTAP/Onyx-Updates/releases/latest".to_string()
}

fn default_current_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_asset_suffix() -> String {
    ".exe".to_string()
}

fn default_update_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_event_capacity() -> usize {
    1000
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}
