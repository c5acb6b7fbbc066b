//! History ledger operations.

use crate::types::{HistoryEntry, JobResult};
use crate::{Error, Result};

use super::{Database, HistoryRow};

impl Database {
    /// Record a completed download
    ///
    /// Called by the job task once the output file is in its final place.
    pub async fn add_history(&self, result: &JobResult) -> Result<i64> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO history (title, platform, size, path, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.title)
        .bind(&result.platform)
        .bind(&result.size)
        .bind(result.path.to_string_lossy().into_owned())
        .bind(&result.date)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(inserted.last_insert_rowid())
    }

    /// All history entries, most recent first
    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, title, platform, size, path, date
            FROM history
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    /// Get a single history entry by ID
    pub async fn get_history_entry(&self, id: i64) -> Result<Option<HistoryEntry>> {
        let row = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, title, platform, size, path, date FROM history WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(row.map(HistoryEntry::from))
    }

    /// Delete the entry at `index` in [`list_history`](Self::list_history) order
    ///
    /// The downloaded file is removed on a best-effort basis: a file that is
    /// already gone or cannot be deleted is logged and the ledger entry is
    /// removed anyway. Returns `None` if `index` is out of range.
    pub async fn delete_history_at(&self, index: usize) -> Result<Option<HistoryEntry>> {
        let row = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, title, platform, size, path, date
            FROM history
            ORDER BY id DESC
            LIMIT 1 OFFSET ?
            "#,
        )
        .bind(index as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        let Some(row) = row else {
            tracing::debug!(index, "History index out of range");
            return Ok(None);
        };

        sqlx::query("DELETE FROM history WHERE id = ?")
            .bind(row.id)
            .execute(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        let entry = HistoryEntry::from(row);
        crate::utils::remove_file_best_effort(&entry.path).await;

        tracing::info!(history_id = entry.id, title = %entry.title, "History entry deleted");
        Ok(Some(entry))
    }

    /// Count history entries
    pub async fn count_history(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM history")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }

    /// Clear all history
    ///
    /// Only ledger rows are removed; downloaded files stay on disk.
    /// Returns the number of records deleted.
    pub async fn clear_history(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM history")
            .execute(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(result.rows_affected())
    }
}
