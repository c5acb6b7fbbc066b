//! Dependency bootstrapper for the external media-processing binary
//!
//! Downloads a zip archive, pulls the binary out of it and installs it next to
//! the application. Progress is reported as whole percents and short status
//! strings so a UI can show a first-run setup screen.

use crate::config::DependencyConfig;
use crate::error::{BootstrapError, Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Outcome of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Where the binary was installed
    pub binary_path: PathBuf,
    /// Archive bytes received
    pub bytes_downloaded: u64,
}

/// Installs the media-processing binary on first use
pub struct DependencyBootstrapper {
    config: DependencyConfig,
    client: reqwest::Client,
    install_lock: tokio::sync::Mutex<()>,
}

impl DependencyBootstrapper {
    /// Create a bootstrapper for the configured archive and binary
    pub fn new(config: DependencyConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("media-dl/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            config,
            client,
            install_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Path the binary is (or will be) installed at
    pub fn binary_path(&self) -> PathBuf {
        self.config.binary_path()
    }

    /// Whether the binary is present
    pub fn is_installed(&self) -> bool {
        self.binary_path().is_file()
    }

    /// Download and install the binary, replacing any existing copy
    ///
    /// `on_progress` receives integer percents, only when the value changes,
    /// starting at 0 and ending at 100. It is not called when the server does
    /// not announce a content length. `on_status` receives short phase messages.
    ///
    /// The temporary archive is removed whether or not the install succeeds.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::DownloadFailed`] / [`BootstrapError::HttpStatus`] if the archive
    ///   could not be fetched
    /// - [`BootstrapError::InvalidArchive`] if it is not a readable zip
    /// - [`BootstrapError::EntryNotFound`] if no entry matches the binary name
    /// - [`BootstrapError::WriteFailed`] if writing to the install directory fails
    pub async fn install<P, S>(&self, mut on_progress: P, mut on_status: S) -> Result<InstallReport>
    where
        P: FnMut(u8) + Send,
        S: FnMut(&str) + Send,
    {
        let _guard = self.install_lock.lock().await;
        self.install_locked(&mut on_progress, &mut on_status).await
    }

    /// Install the binary unless it is already present
    ///
    /// Concurrent callers are serialised, so at most one install runs and later
    /// callers see the installed binary. Returns `None` if nothing was done.
    pub async fn ensure_installed<P, S>(
        &self,
        mut on_progress: P,
        mut on_status: S,
    ) -> Result<Option<InstallReport>>
    where
        P: FnMut(u8) + Send,
        S: FnMut(&str) + Send,
    {
        let _guard = self.install_lock.lock().await;
        if self.is_installed() {
            tracing::debug!(path = %self.binary_path().display(), "Dependency already installed");
            return Ok(None);
        }
        self.install_locked(&mut on_progress, &mut on_status)
            .await
            .map(Some)
    }

    async fn install_locked(
        &self,
        on_progress: &mut (dyn FnMut(u8) + Send),
        on_status: &mut (dyn FnMut(&str) + Send),
    ) -> Result<InstallReport> {
        let install_dir = &self.config.install_dir;
        tokio::fs::create_dir_all(install_dir)
            .await
            .map_err(|e| BootstrapError::WriteFailed {
                path: install_dir.clone(),
                reason: e.to_string(),
            })?;

        let archive_path = self.temp_archive_path();
        let result = self
            .download_and_extract(&archive_path, on_progress, on_status)
            .await;

        on_status("Cleaning up...");
        crate::utils::remove_file_best_effort(&archive_path).await;

        match &result {
            Ok(report) => tracing::info!(
                path = %report.binary_path.display(),
                bytes = report.bytes_downloaded,
                "Dependency installed"
            ),
            Err(e) => tracing::error!(error = %e, "Dependency install failed"),
        }
        result
    }

    async fn download_and_extract(
        &self,
        archive_path: &Path,
        on_progress: &mut (dyn FnMut(u8) + Send),
        on_status: &mut (dyn FnMut(&str) + Send),
    ) -> Result<InstallReport> {
        let binary_name = self.config.binary_name.clone();

        on_status(&format!("Downloading {}...", binary_name));
        let bytes_downloaded = self.download_archive(archive_path, on_progress).await?;

        on_status(&format!("Extracting {}...", binary_name));
        let archive = archive_path.to_path_buf();
        let dest = self.binary_path();
        let dest_clone = dest.clone();
        tokio::task::spawn_blocking(move || extract_binary(&archive, &dest_clone, &binary_name))
            .await
            .map_err(|e| Error::Other(format!("extraction task panicked: {}", e)))??;

        Ok(InstallReport {
            binary_path: dest,
            bytes_downloaded,
        })
    }

    /// Stream the archive to disk, reporting whole-percent progress
    async fn download_archive(
        &self,
        archive_path: &Path,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<u64> {
        let url = &self.config.archive_url;
        tracing::info!(url = %url, "Downloading dependency archive");

        let download_failed = |e: reqwest::Error| BootstrapError::DownloadFailed {
            url: url.clone(),
            reason: e.to_string(),
        };
        let write_failed = |e: std::io::Error| BootstrapError::WriteFailed {
            path: archive_path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut response = self.client.get(url).send().await.map_err(download_failed)?;
        if !response.status().is_success() {
            return Err(BootstrapError::HttpStatus {
                url: url.clone(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let total = response.content_length().filter(|len| *len > 0);
        let mut file = tokio::fs::File::create(archive_path)
            .await
            .map_err(write_failed)?;

        let mut downloaded: u64 = 0;
        let mut last_percent: Option<u8> = None;
        let mut publish = |percent: u8| {
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                on_progress(percent);
            }
        };

        if total.is_some() {
            publish(0);
        }

        while let Some(chunk) = response.chunk().await.map_err(download_failed)? {
            file.write_all(&chunk).await.map_err(write_failed)?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total {
                let percent = (downloaded.saturating_mul(100) / total).min(100) as u8;
                publish(percent);
            }
        }
        file.flush().await.map_err(write_failed)?;

        if total.is_some() {
            publish(100);
        }

        tracing::debug!(bytes = downloaded, "Dependency archive downloaded");
        Ok(downloaded)
    }

    fn temp_archive_path(&self) -> PathBuf {
        let stem = Path::new(&self.config.binary_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.binary_name.clone());
        self.config.install_dir.join(format!("{}_temp.zip", stem))
    }
}

/// Whether a zip entry path names the binary
fn entry_matches(entry_name: &str, binary_name: &str) -> bool {
    entry_name
        .rsplit(['/', '\\'])
        .next()
        .is_some_and(|file| file == binary_name)
}

/// Copy the first matching entry of `archive_path` to `dest`
fn extract_binary(
    archive_path: &Path,
    dest: &Path,
    binary_name: &str,
) -> std::result::Result<(), BootstrapError> {
    let invalid = |reason: String| BootstrapError::InvalidArchive {
        archive: archive_path.to_path_buf(),
        reason,
    };
    let write_failed = |e: std::io::Error| BootstrapError::WriteFailed {
        path: dest.to_path_buf(),
        reason: e.to_string(),
    };

    let file = std::fs::File::open(archive_path).map_err(|e| invalid(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

    let mut found = None;
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| invalid(e.to_string()))?;
        if entry.is_file() && entry_matches(entry.name(), binary_name) {
            found = Some(index);
            break;
        }
    }
    let index = found.ok_or_else(|| BootstrapError::EntryNotFound {
        binary: binary_name.to_string(),
    })?;

    let mut entry = archive.by_index(index).map_err(|e| invalid(e.to_string()))?;
    tracing::debug!(entry = entry.name(), dest = %dest.display(), "Extracting binary");

    // Write beside the destination and rename so a partial copy is never visible
    let partial = dest.with_extension("part");
    let copy_result = (|| -> std::io::Result<()> {
        let mut out = std::fs::File::create(&partial)?;
        std::io::copy(&mut entry, &mut out)?;
        out.sync_all()?;
        Ok(())
    })();
    if let Err(e) = copy_result {
        let _ = std::fs::remove_file(&partial);
        return Err(write_failed(e));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&partial, std::fs::Permissions::from_mode(0o755))
            .map_err(write_failed)?;
    }

    std::fs::rename(&partial, dest).map_err(write_failed)?;
    Ok(())
}
