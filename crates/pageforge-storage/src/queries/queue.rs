// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work queue operations.
//!
//! The `idx_queue_pending_page` partial unique index enforces the invariant
//! that at most one pending entry exists per page; `enqueue` translates the
//! constraint violation into a `false` return rather than an error.

use chrono::{DateTime, Utc};
use pageforge_core::{ForgeError, JobStatus};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{format_ts, parse_ts, QueueItem, QueueStats};

fn row_to_item(row: &rusqlite::Row<'_>) -> Result<QueueItem, rusqlite::Error> {
    let status: String = row.get(2)?;
    let selection: Option<String> = row.get(3)?;
    let scheduled_at: String = row.get(5)?;
    let queued_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(QueueItem {
        id: row.get(0)?,
        page_id: row.get(1)?,
        status: status
            .parse()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
        block_selection: selection
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
        error: row.get(4)?,
        scheduled_at: parse_row_ts(&scheduled_at)?,
        queued_at: parse_row_ts(&queued_at)?,
        updated_at: parse_row_ts(&updated_at)?,
    })
}

fn parse_row_ts(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

const ITEM_COLUMNS: &str =
    "id, page_id, status, block_selection, error, scheduled_at, queued_at, updated_at";

/// Insert a new pending entry for the page.
///
/// Returns `false` without inserting when a pending entry for `page_id`
/// already exists.
pub async fn enqueue(
    db: &Database,
    page_id: &str,
    scheduled_at: DateTime<Utc>,
    block_selection: Option<&[String]>,
) -> Result<bool, ForgeError> {
    let page_id = page_id.to_string();
    let selection_json = block_selection
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ForgeError::Storage {
            source: Box::new(e),
        })?;
    let scheduled = format_ts(scheduled_at);
    let now = format_ts(Utc::now());

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                "INSERT INTO queue (page_id, status, block_selection, scheduled_at, queued_at, updated_at)
                 VALUES (?1, 'pending', ?2, ?3, ?4, ?4)",
                params![page_id, selection_json, scheduled, now],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch the most recent non-terminal entry for a page, if any.
pub async fn get_active(db: &Database, page_id: &str) -> Result<Option<QueueItem>, ForgeError> {
    let page_id = page_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<QueueItem>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM queue
                 WHERE page_id = ?1 AND status IN ('pending', 'processing')
                 ORDER BY id DESC LIMIT 1"
            ))?;
            match stmt.query_row(params![page_id], row_to_item) {
                Ok(item) => Ok(Some(item)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Update the status (and error string) of the page's most recent
/// non-terminal entry.
///
/// Returns `false` when no such entry exists.
pub async fn update_status(
    db: &Database,
    page_id: &str,
    status: JobStatus,
    error: Option<&str>,
) -> Result<bool, ForgeError> {
    let page_id = page_id.to_string();
    let status = status.to_string();
    let error = error.map(str::to_string);
    let now = format_ts(Utc::now());

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE queue SET status = ?1, error = ?2, updated_at = ?3
                 WHERE id = (
                     SELECT id FROM queue
                     WHERE page_id = ?4 AND status IN ('pending', 'processing')
                     ORDER BY id DESC LIMIT 1
                 )",
                params![status, error, now, page_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every entry for the page. Returns `false` when none existed.
pub async fn remove(db: &Database, page_id: &str) -> Result<bool, ForgeError> {
    let page_id = page_id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let deleted = conn.execute("DELETE FROM queue WHERE page_id = ?1", params![page_id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Empty the queue entirely (emergency recovery).
pub async fn clear(db: &Database) -> Result<(), ForgeError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM queue", [])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All pending entries ordered by scheduled time (startup re-arm).
pub async fn pending(db: &Database) -> Result<Vec<QueueItem>, ForgeError> {
    db.connection()
        .call(|conn| -> Result<Vec<QueueItem>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM queue
                 WHERE status = 'pending' ORDER BY scheduled_at ASC"
            ))?;
            let items = stmt
                .query_map([], row_to_item)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
        .await
        .map_err(map_tr_err)
}

/// Per-status counts.
pub async fn stats(db: &Database) -> Result<QueueStats, ForgeError> {
    db.connection()
        .call(|conn| -> Result<QueueStats, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT status, COUNT(*) FROM queue GROUP BY status")?;
            let mut out = QueueStats::default();
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
            })?;
            for row in rows {
                let (status, count) = row?;
                match status.as_str() {
                    "pending" => out.pending = count,
                    "processing" => out.processing = count,
                    "completed" => out.completed = count,
                    "failed" => out.failed = count,
                    _ => {}
                }
                out.total += count;
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

/// Latest scheduled time across all entries, if the queue is non-empty.
pub async fn last_scheduled_at(db: &Database) -> Result<Option<DateTime<Utc>>, ForgeError> {
    let raw = db
        .connection()
        .call(|conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row("SELECT MAX(scheduled_at) FROM queue", [], |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)?;
    raw.map(|s| parse_ts(&s)).transpose()
}

/// Average seconds from scheduled time to final update over completed jobs.
///
/// `None` when no job has completed yet.
pub async fn average_job_duration_secs(db: &Database) -> Result<Option<f64>, ForgeError> {
    db.connection()
        .call(|conn| -> Result<Option<f64>, rusqlite::Error> {
            conn.query_row(
                "SELECT AVG((julianday(updated_at) - julianday(scheduled_at)) * 86400.0)
                 FROM queue WHERE status = 'completed'",
                [],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn enqueue_then_duplicate_is_rejected() {
        let db = test_db().await;
        let at = Utc::now();

        assert!(enqueue(&db, "p1", at, None).await.unwrap());
        assert!(!enqueue(&db, "p1", at, None).await.unwrap());

        let stats = stats(&db).await.unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn re_enqueue_allowed_after_terminal_state() {
        let db = test_db().await;
        let at = Utc::now();

        assert!(enqueue(&db, "p1", at, None).await.unwrap());
        assert!(update_status(&db, "p1", JobStatus::Processing, None)
            .await
            .unwrap());
        assert!(update_status(&db, "p1", JobStatus::Completed, None)
            .await
            .unwrap());

        // Completed row stays for audit; a fresh pending row is allowed.
        assert!(enqueue(&db, "p1", at, None).await.unwrap());
        let stats = stats(&db).await.unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total, 2);
    }

    #[tokio::test]
    async fn update_status_missing_page_returns_false() {
        let db = test_db().await;
        assert!(!update_status(&db, "ghost", JobStatus::Failed, Some("nope"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn block_selection_round_trips() {
        let db = test_db().await;
        let selection = vec!["metadata".to_string(), "faq".to_string()];
        assert!(enqueue(&db, "p1", Utc::now(), Some(&selection))
            .await
            .unwrap());

        let item = get_active(&db, "p1").await.unwrap().unwrap();
        assert_eq!(item.block_selection.as_deref(), Some(&selection[..]));
        assert_eq!(item.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn error_string_is_persisted() {
        let db = test_db().await;
        assert!(enqueue(&db, "p1", Utc::now(), None).await.unwrap());
        assert!(
            update_status(&db, "p1", JobStatus::Failed, Some("block hero: boom"))
                .await
                .unwrap()
        );

        // Terminal rows are no longer active but remain queryable via stats.
        assert!(get_active(&db, "p1").await.unwrap().is_none());
        let stats = stats(&db).await.unwrap();
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn remove_deletes_all_rows_for_page() {
        let db = test_db().await;
        assert!(enqueue(&db, "p1", Utc::now(), None).await.unwrap());
        assert!(remove(&db, "p1").await.unwrap());
        assert!(!remove(&db, "p1").await.unwrap());
        assert_eq!(stats(&db).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn clear_empties_queue() {
        let db = test_db().await;
        for i in 0..3 {
            assert!(enqueue(&db, &format!("p{i}"), Utc::now(), None)
                .await
                .unwrap());
        }
        clear(&db).await.unwrap();
        assert_eq!(stats(&db).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn pending_is_ordered_by_scheduled_time() {
        let db = test_db().await;
        let base = Utc::now();
        assert!(enqueue(&db, "late", base + Duration::seconds(60), None)
            .await
            .unwrap());
        assert!(enqueue(&db, "early", base, None).await.unwrap());

        let items = pending(&db).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].page_id, "early");
        assert_eq!(items[1].page_id, "late");
    }

    #[tokio::test]
    async fn last_scheduled_and_average_duration() {
        let db = test_db().await;
        assert!(last_scheduled_at(&db).await.unwrap().is_none());
        assert!(average_job_duration_secs(&db).await.unwrap().is_none());

        let at = Utc::now() + Duration::seconds(90);
        assert!(enqueue(&db, "p1", at, None).await.unwrap());
        let last = last_scheduled_at(&db).await.unwrap().unwrap();
        assert_eq!(format_ts(last), format_ts(at));
    }
}
