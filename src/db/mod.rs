//! Database layer for media-dl
//!
//! Handles SQLite persistence for the history ledger of completed downloads.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`history`] - History ledger operations

use crate::types::HistoryEntry;
use sqlx::{FromRow, sqlite::SqlitePool};
use std::path::PathBuf;

mod history;
mod migrations;

/// History record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    /// Unique database ID
    pub id: i64,
    /// Media title
    pub title: String,
    /// Source platform tag
    pub platform: String,
    /// Human-readable size
    pub size: String,
    /// Output file path
    pub path: String,
    /// Completion timestamp string
    pub date: String,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        HistoryEntry {
            id: row.id,
            title: row.title,
            platform: row.platform,
            size: row.size,
            path: PathBuf::from(row.path),
            date: row.date,
        }
    }
}

/// Database handle for media-dl
pub struct Database {
    pool: SqlitePool,
}
