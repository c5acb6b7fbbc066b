//! Error types for media-dl
//!
//! This module provides the error taxonomy for the library:
//! - Domain-specific error types (Extraction, Bootstrap, Persistence, Database)
//! - A top-level [`Error`] that every public operation returns
//! - Machine-readable error codes for consumers that render errors in a UI
//!
//! Cancellation is deliberately *not* an error at the job layer. A cancelled job
//! reaches the `Cancelled` terminal state; [`ExtractionError::Aborted`] only exists
//! so an adapter can report that it stopped because the job asked it to.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_path")
        key: Option<String>,
    },

    /// History ledger operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Settings persistence failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Dependency bootstrap failed
    #[error("bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// Extraction adapter failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Submitted URL was rejected
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No job with this id is registered
    #[error("job {0} not found")]
    JobNotFound(u64),

    /// The external processing binary has not been installed yet
    #[error("required dependency missing: {0}")]
    DependencyMissing(PathBuf),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Persistence(PersistenceError::NotFound { .. }) => "settings_not_found",
            Error::Persistence(PersistenceError::Parse { .. }) => "settings_parse_error",
            Error::Persistence(PersistenceError::Io { .. }) => "settings_io_error",
            Error::Bootstrap(BootstrapError::EntryNotFound { .. }) => "dependency_entry_not_found",
            Error::Bootstrap(_) => "bootstrap_error",
            Error::Extraction(ExtractionError::Aborted) => "aborted",
            Error::Extraction(_) => "extraction_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::InvalidUrl(_) => "invalid_url",
            Error::JobNotFound(_) => "job_not_found",
            Error::DependencyMissing(_) => "dependency_missing",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Errors loading or saving a persisted document (settings file)
///
/// The three kinds are kept apart so callers can treat a missing file as
/// "first run" while still surfacing corrupt or unreadable files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The document does not exist yet
    #[error("{path} does not exist")]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The document exists but could not be parsed
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// Path of the malformed document
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Reading or writing the document failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Dependency bootstrap errors (download, archive, install)
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The archive request failed before any bytes were received
    #[error("failed to fetch {url}: {reason}")]
    DownloadFailed {
        /// Archive URL
        url: String,
        /// Human-readable reason
        reason: String,
    },

    /// The archive server answered with a non-success status
    #[error("archive server returned HTTP {status} for {url}")]
    HttpStatus {
        /// Archive URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The archive could not be read as a zip file
    #[error("invalid archive {archive}: {reason}")]
    InvalidArchive {
        /// Path of the downloaded archive
        archive: PathBuf,
        /// Reason reported by the zip reader
        reason: String,
    },

    /// No entry in the archive matched the binary name
    #[error("could not find {binary} in archive")]
    EntryNotFound {
        /// The binary name that was searched for
        binary: String,
    },

    /// Writing to disk failed
    #[error("failed to write {path}: {reason}")]
    WriteFailed {
        /// Path being written
        path: PathBuf,
        /// Reason the write failed
        reason: String,
    },
}

/// Errors reported by an extraction adapter
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// The adapter stopped because the job's progress reporter asked it to
    #[error("aborted by job cancellation")]
    Aborted,

    /// The extraction tool is not installed or cannot be located
    #[error("extraction tool not found: {0}")]
    ToolNotFound(String),

    /// The extraction tool exited unsuccessfully
    #[error("extraction process failed (exit code {exit_code:?}): {stderr}")]
    Process {
        /// Exit code, if the process exited normally
        exit_code: Option<i32>,
        /// Captured diagnostic output
        stderr: String,
    },

    /// Network failure while resolving or downloading
    #[error("network failure: {0}")]
    Network(String),

    /// The tool produced output that could not be interpreted
    #[error("unexpected extractor output: {0}")]
    InvalidOutput(String),

    /// The media is unavailable (private, removed, geo-blocked, unsupported)
    #[error("media unavailable: {0}")]
    Unavailable(String),
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_distinguish_persistence_kinds() {
        let not_found = Error::Persistence(PersistenceError::NotFound {
            path: PathBuf::from("settings.json"),
        });
        let parse = Error::Persistence(PersistenceError::Parse {
            path: PathBuf::from("settings.json"),
            reason: "expected value at line 1".into(),
        });
        let io = Error::Persistence(PersistenceError::Io {
            path: PathBuf::from("settings.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });

        assert_eq!(not_found.code(), "settings_not_found");
        assert_eq!(parse.code(), "settings_parse_error");
        assert_eq!(io.code(), "settings_io_error");
    }

    #[test]
    fn aborted_extraction_has_its_own_code() {
        assert_eq!(Error::from(ExtractionError::Aborted).code(), "aborted");
        assert_eq!(
            Error::from(ExtractionError::Network("reset".into())).code(),
            "extraction_error"
        );
    }

    #[test]
    fn bootstrap_entry_not_found_message_names_binary() {
        let err = Error::from(BootstrapError::EntryNotFound {
            binary: "ffmpeg.exe".into(),
        });
        assert_eq!(err.code(), "dependency_entry_not_found");
        assert_eq!(
            err.to_string(),
            "bootstrap error: could not find ffmpeg.exe in archive"
        );
    }

    #[test]
    fn job_not_found_display() {
        assert_eq!(Error::JobNotFound(7).to_string(), "job 7 not found");
        assert_eq!(Error::JobNotFound(7).code(), "job_not_found");
    }
}
