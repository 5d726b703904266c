// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation ledger for persisting per-block provider calls to SQLite.
//!
//! Every block generation attempt is recorded in the `generation_log` table
//! with its token breakdown and calculated cost in USD. The ledger supports
//! monthly totals for budget enforcement and a rolling success rate for
//! health alerting.

use std::sync::Arc;

use pageforge_core::{ForgeError, PageId, TokenUsage};
use pageforge_storage::Database;
use strum::{Display, EnumString};
use tracing::info;

/// Convert a tokio-rusqlite error into `ForgeError::Storage`.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ForgeError {
    ForgeError::Storage {
        source: Box::new(e),
    }
}

/// Outcome of one recorded generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
}

/// A single ledger entry representing one provider call for one block.
#[derive(Debug, Clone)]
pub struct GenerationEntry {
    /// Row id, zero until persisted.
    pub id: i64,
    /// Target page.
    pub page_id: String,
    /// Block type that was generated, e.g. "hero" or "faq".
    pub block_type: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// Calculated cost in USD, rounded to six decimals.
    pub cost_usd: f64,
    /// Model that served the request.
    pub model: String,
    pub status: LogStatus,
    /// Failure detail when `status` is `Failed`.
    pub error_message: Option<String>,
    /// User who initiated the job, when known.
    pub user_id: Option<String>,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

fn now_ts() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

impl GenerationEntry {
    /// Entry for a successful generation with its token usage and cost.
    pub fn success(
        page_id: &PageId,
        block_type: &str,
        usage: &TokenUsage,
        cost_usd: f64,
        model: &str,
        user_id: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            page_id: page_id.0.clone(),
            block_type: block_type.to_string(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cost_usd,
            model: model.to_string(),
            status: LogStatus::Success,
            error_message: None,
            user_id,
            created_at: now_ts(),
        }
    }

    /// Entry for a failed generation. Token counts are zero; failures still
    /// count against the rolling success rate.
    pub fn failure(
        page_id: &PageId,
        block_type: &str,
        model: &str,
        error: &str,
        user_id: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            page_id: page_id.0.clone(),
            block_type: block_type.to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            cost_usd: 0.0,
            model: model.to_string(),
            status: LogStatus::Failed,
            error_message: Some(error.to_string()),
            user_id,
            created_at: now_ts(),
        }
    }
}

/// Persistent generation ledger backed by the shared SQLite database.
#[derive(Clone)]
pub struct GenerationLedger {
    db: Arc<Database>,
}

impl GenerationLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record a ledger entry, returning its row id.
    pub async fn record(&self, entry: &GenerationEntry) -> Result<i64, ForgeError> {
        let page_id = entry.page_id.clone();
        let block_type = entry.block_type.clone();
        let prompt_tokens = entry.prompt_tokens;
        let completion_tokens = entry.completion_tokens;
        let total_tokens = entry.total_tokens;
        let cost_usd = entry.cost_usd;
        let model = entry.model.clone();
        let status = entry.status.to_string();
        let error_message = entry.error_message.clone();
        let user_id = entry.user_id.clone();
        let created_at = entry.created_at.clone();

        let id = self
            .db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO generation_log (page_id, block_type, prompt_tokens, \
                     completion_tokens, total_tokens, cost_usd, model, status, \
                     error_message, user_id, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    rusqlite::params![
                        page_id,
                        block_type,
                        prompt_tokens,
                        completion_tokens,
                        total_tokens,
                        cost_usd,
                        model,
                        status,
                        error_message,
                        user_id,
                        created_at,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            page_id = %entry.page_id,
            block_type = %entry.block_type,
            model = %entry.model,
            status = %entry.status,
            total_tokens = entry.total_tokens,
            cost_usd = entry.cost_usd,
            "generation recorded"
        );

        Ok(id)
    }

    /// Sum of costs for a given year-month prefix (e.g. "2026-08").
    pub async fn monthly_total(&self, year_month: &str) -> Result<f64, ForgeError> {
        let prefix = format!("{year_month}%");
        self.db
            .connection()
            .call(move |conn| -> Result<f64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COALESCE(SUM(cost_usd), 0.0) FROM generation_log \
                     WHERE created_at LIKE ?1",
                    rusqlite::params![prefix],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// The most recent entries, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<GenerationEntry>, ForgeError> {
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<GenerationEntry>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, page_id, block_type, prompt_tokens, completion_tokens, \
                     total_tokens, cost_usd, model, status, error_message, user_id, \
                     created_at FROM generation_log ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map([limit], |row| {
                    let status: String = row.get(8)?;
                    Ok(GenerationEntry {
                        id: row.get(0)?,
                        page_id: row.get(1)?,
                        block_type: row.get(2)?,
                        prompt_tokens: row.get(3)?,
                        completion_tokens: row.get(4)?,
                        total_tokens: row.get(5)?,
                        cost_usd: row.get(6)?,
                        model: row.get(7)?,
                        status: status.parse().unwrap_or(LogStatus::Failed),
                        error_message: row.get(9)?,
                        user_id: row.get(10)?,
                        created_at: row.get(11)?,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Success percentage over the most recent `window` entries.
    ///
    /// Returns `None` when the ledger has fewer than `window` entries, so a
    /// cold system never trips the low-success alert.
    pub async fn success_rate(&self, window: u32) -> Result<Option<f64>, ForgeError> {
        let entries = self.recent(window).await?;
        if (entries.len() as u32) < window || window == 0 {
            return Ok(None);
        }
        let successes = entries
            .iter()
            .filter(|e| e.status == LogStatus::Success)
            .count();
        Ok(Some(successes as f64 / entries.len() as f64 * 100.0))
    }
}
