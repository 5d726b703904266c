// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities, plus the timestamp format shared
//! by every table.

use chrono::{DateTime, Utc};
use pageforge_core::{ForgeError, JobStatus};
use serde::{Deserialize, Serialize};

/// One page awaiting (or having finished) generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    pub page_id: String,
    pub status: JobStatus,
    /// Explicit ordered block selection; `None` means all blocks.
    pub block_selection: Option<Vec<String>>,
    pub error: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub queued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-status queue counts for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub total: u64,
}

/// One cached AI-generated image, keyed on the normalized context hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCacheRecord {
    pub context_hash: String,
    pub title: String,
    pub category: String,
    pub generation_prompt: String,
    pub attachment_id: String,
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

/// Format a timestamp the way every table stores it (ISO 8601, millisecond
/// precision, UTC).
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse a stored timestamp back into a `DateTime<Utc>`.
pub fn parse_ts(s: &str) -> Result<DateTime<Utc>, ForgeError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ForgeError::Storage {
            source: Box::new(e),
        })
}
