//! Application update check against a release feed
//!
//! Only detection is implemented: the checker tells the caller whether a different
//! release with an installable asset exists. Downloading and swapping the running
//! binary is left to the embedding application.

use crate::config::UpdateConfig;
use crate::error::Result;
use serde::Deserialize;

/// Result of an update check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// A different release is published
    Available {
        /// Release version, without a leading `v`
        version: String,
        /// Download URL of the installable asset
        download_url: String,
    },
    /// The running version is current (or no installable asset was published)
    UpToDate,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

/// Checks the configured release feed for a new version
pub struct UpdateChecker {
    config: UpdateConfig,
    client: reqwest::Client,
}

impl UpdateChecker {
    /// Create a checker for the configured feed
    pub fn new(config: UpdateConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("media-dl/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self { config, client }
    }

    /// Query the release feed
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`](crate::Error::Network) if the feed cannot be
    /// reached, answers with an error status, or returns a malformed document.
    /// Callers that only want a yes/no answer can treat errors as "no update".
    pub async fn check_for_updates(&self) -> Result<UpdateStatus> {
        tracing::debug!(url = %self.config.release_api_url, "Checking for updates");

        let release: Release = self
            .client
            .get(&self.config.release_api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let latest = normalize_version(&release.tag_name);
        let current = normalize_version(&self.config.current_version);
        if latest == current {
            tracing::debug!(version = %current, "Application is up to date");
            return Ok(UpdateStatus::UpToDate);
        }

        let asset = release
            .assets
            .into_iter()
            .find(|asset| asset.name.ends_with(&self.config.asset_suffix));

        match asset {
            Some(asset) => {
                tracing::info!(current = %current, latest = %latest, "Update available");
                Ok(UpdateStatus::Available {
                    version: latest.to_string(),
                    download_url: asset.browser_download_url,
                })
            }
            None => {
                tracing::debug!(
                    latest = %latest,
                    suffix = %self.config.asset_suffix,
                    "Release has no installable asset"
                );
                Ok(UpdateStatus::UpToDate)
            }
        }
    }
}

fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}
