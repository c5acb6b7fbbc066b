//! User settings: a persisted key/value document with write-through saves.
//!
//! The document is JSON with the keys `download_path`, `resolution`, `format`,
//! `proxy`, `cookies_path`, `embed_subs` and `save_thumbnail`. It is loaded once,
//! merged over the built-in defaults, and rewritten on every mutation.

use crate::error::{Error, PersistenceError, Result};
use crate::types::{JobOptions, OutputMode, Resolution};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Keys accepted by [`SettingsStore::set`]
pub const SETTINGS_KEYS: [&str; 7] = [
    "download_path",
    "resolution",
    "format",
    "proxy",
    "cookies_path",
    "embed_subs",
    "save_thumbnail",
];

/// User-facing preferences
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Where downloads are written
    pub download_path: PathBuf,
    /// Preferred video resolution
    pub resolution: Resolution,
    /// Default output format
    pub format: OutputMode,
    /// Network proxy URL (None or empty = direct)
    pub proxy: Option<String>,
    /// Cookies file for authenticated sites
    pub cookies_path: Option<PathBuf>,
    /// Embed subtitles into video downloads
    pub embed_subs: bool,
    /// Keep thumbnails next to video downloads
    pub save_thumbnail: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_path: crate::utils::default_download_dir(),
            resolution: Resolution::Best,
            format: OutputMode::VideoAudio,
            proxy: None,
            cookies_path: None,
            embed_subs: false,
            save_thumbnail: false,
        }
    }
}

impl Settings {
    /// Snapshot these settings into options for a new job
    ///
    /// Empty proxy or cookie values are treated as unset.
    pub fn job_options(&self, mode: OutputMode) -> JobOptions {
        JobOptions {
            download_path: self.download_path.clone(),
            mode,
            resolution: self.resolution,
            proxy: self.proxy.clone().filter(|p| !p.trim().is_empty()),
            cookies_path: self
                .cookies_path
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            embed_subs: self.embed_subs,
            save_thumbnail: self.save_thumbnail,
        }
    }

    /// Parse a settings document, overlaying known keys onto the defaults
    ///
    /// Keys are applied one at a time; a stored value of the wrong type is
    /// skipped so the remaining keys still take effect.
    fn merge_document(content: &str) -> std::result::Result<Self, String> {
        let document: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        let serde_json::Value::Object(stored) = document else {
            return Err("settings document is not a JSON object".to_string());
        };

        let mut merged = match serde_json::to_value(Settings::default()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return Err("failed to serialize default settings".to_string()),
        };
        for (key, value) in stored {
            if !merged.contains_key(&key) {
                tracing::debug!(key = %key, "Ignoring unknown settings key");
                continue;
            }

            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value);
            match serde_json::from_value::<Settings>(serde_json::Value::Object(candidate.clone())) {
                Ok(_) => merged = candidate,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Ignoring invalid stored setting");
                }
            }
        }

        serde_json::from_value(serde_json::Value::Object(merged)).map_err(|e| e.to_string())
    }
}

/// Persisted settings with write-through saves
///
/// Constructed explicitly and shared by reference; there is no global instance.
pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<Settings>,
    load_warning: Option<PersistenceError>,
}

impl SettingsStore {
    /// Open the settings document at `path`
    ///
    /// A missing document means first run and yields defaults silently. A corrupt
    /// or unreadable document also yields defaults, but the problem is logged and
    /// kept available through [`load_warning`](Self::load_warning). The configured
    /// download directory is created if it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let (settings, load_warning) = match Self::load(&path).await {
            Ok(settings) => (settings, None),
            Err(PersistenceError::NotFound { .. }) => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                (Settings::default(), None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load settings, using defaults");
                (Settings::default(), Some(e))
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&settings.download_path).await {
            tracing::warn!(
                path = %settings.download_path.display(),
                error = %e,
                "Failed to create download directory"
            );
        }

        Self {
            path,
            settings: RwLock::new(settings),
            load_warning,
        }
    }

    async fn load(path: &Path) -> std::result::Result<Settings, PersistenceError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PersistenceError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PersistenceError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        Settings::merge_document(&content).map_err(|reason| PersistenceError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Problem encountered while loading, if any
    pub fn load_warning(&self) -> Option<&PersistenceError> {
        self.load_warning.as_ref()
    }

    /// Path of the settings document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings snapshot
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Current value of a single key, as JSON
    pub async fn get_value(&self, key: &str) -> Option<serde_json::Value> {
        let settings = self.settings.read().await;
        match serde_json::to_value(&*settings) {
            Ok(serde_json::Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }

    /// Set a single key and persist immediately
    ///
    /// Unknown keys and values of the wrong type are rejected with
    /// [`Error::Config`] and leave the settings unchanged. If the value is valid
    /// but the save fails, the new value stays in effect for this session and
    /// the persistence error is returned.
    pub async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        if !SETTINGS_KEYS.contains(&key) {
            return Err(Error::Config {
                message: format!("unknown settings key '{}'", key),
                key: Some(key.to_string()),
            });
        }

        let mut settings = self.settings.write().await;
        let mut map = match serde_json::to_value(&*settings)? {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(Error::Other(
                    "settings did not serialize to an object".to_string(),
                ));
            }
        };
        map.insert(key.to_string(), value);

        let updated: Settings =
            serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| Error::Config {
                message: format!("invalid value for '{}': {}", key, e),
                key: Some(key.to_string()),
            })?;

        *settings = updated;
        tracing::debug!(key = %key, "Setting changed");
        self.save(&settings).await
    }

    /// Apply a change to the settings and persist immediately
    pub async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        change(&mut settings);
        self.save(&settings).await
    }

    /// Write the current settings to disk
    pub async fn flush(&self) -> Result<()> {
        let settings = self.settings.read().await;
        self.save(&settings).await
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let io_error = |source: std::io::Error| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        // Write to a sibling file first so a crash never leaves a truncated document
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await.map_err(io_error)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(io_error)?;

        Ok(())
    }
}
