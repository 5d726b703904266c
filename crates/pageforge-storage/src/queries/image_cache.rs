// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation cache operations.
//!
//! One row per normalized (title, category) context hash. `touch` records a
//! cache hit; rows are removed only by an explicit cache clear.

use chrono::Utc;
use pageforge_core::ForgeError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{format_ts, ImageCacheRecord};

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<ImageCacheRecord, rusqlite::Error> {
    let created_at: String = row.get(6)?;
    let last_used: String = row.get(7)?;
    Ok(ImageCacheRecord {
        context_hash: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        generation_prompt: row.get(3)?,
        attachment_id: row.get(4)?,
        usage_count: row.get(5)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?
            .with_timezone(&Utc),
        last_used: chrono::DateTime::parse_from_rfc3339(&last_used)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?
            .with_timezone(&Utc),
    })
}

/// Look up a cache record by its context hash.
pub async fn find_by_hash(
    db: &Database,
    context_hash: &str,
) -> Result<Option<ImageCacheRecord>, ForgeError> {
    let hash = context_hash.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ImageCacheRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT context_hash, title, category, generation_prompt, attachment_id,
                        usage_count, created_at, last_used
                 FROM image_cache WHERE context_hash = ?1",
            )?;
            match stmt.query_row(params![hash], row_to_record) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Record a cache hit: increment `usage_count` and refresh `last_used`.
pub async fn touch(db: &Database, context_hash: &str) -> Result<(), ForgeError> {
    let hash = context_hash.to_string();
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE image_cache SET usage_count = usage_count + 1, last_used = ?1
                 WHERE context_hash = ?2",
                params![now, hash],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a fresh cache record, replacing any existing row with the same hash.
pub async fn upsert(db: &Database, record: &ImageCacheRecord) -> Result<(), ForgeError> {
    let hash = record.context_hash.clone();
    let title = record.title.clone();
    let category = record.category.clone();
    let prompt = record.generation_prompt.clone();
    let attachment_id = record.attachment_id.clone();
    let usage_count = record.usage_count;
    let created_at = format_ts(record.created_at);
    let last_used = format_ts(record.last_used);

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR REPLACE INTO image_cache
                 (context_hash, title, category, generation_prompt, attachment_id,
                  usage_count, created_at, last_used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    hash,
                    title,
                    category,
                    prompt,
                    attachment_id,
                    usage_count,
                    created_at,
                    last_used
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Explicit cache clear.
pub async fn clear(db: &Database) -> Result<(), ForgeError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute("DELETE FROM image_cache", [])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
