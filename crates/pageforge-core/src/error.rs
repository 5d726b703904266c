// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Pageforge generation pipeline.
//!
//! The taxonomy follows the pipeline's retry policy: transient-retryable
//! errors are handled inside the provider client (or once more at the
//! orchestrator for rate limits), fatal-request errors surface immediately,
//! and budget exhaustion blocks a single block generation without retry.

use thiserror::Error;

/// The primary error type used across all Pageforge adapter traits and
/// pipeline operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Host CMS adapter errors (record access, metadata, media library).
    #[error("cms error: {message}")]
    Cms { message: String },

    /// Provider errors that survived the client's internal retries
    /// (upstream 5xx, exhausted network retries).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider request timed out after the client's single timeout retry.
    #[error("provider request timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Upstream rate limit (429). Not retried by the client; the orchestrator
    /// decides whether to wait and retry using the optional hint.
    #[error("rate limited by provider")]
    RateLimited {
        /// Seconds to wait before retrying, if the upstream supplied one.
        retry_after: Option<u64>,
    },

    /// Upstream rejected the API key (401). Never retried.
    #[error("invalid provider credentials")]
    InvalidCredentials,

    /// Provider returned a body that could not be parsed into the expected shape.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Monthly budget reached. Aborts the current block only.
    #[error("budget exceeded: {message}")]
    BudgetExceeded { message: String },

    /// A block type tag that is not present in the registry.
    #[error("unknown block type: {0}")]
    UnknownBlockType(String),

    /// Target page is missing or not of the expected kind.
    #[error("invalid page {page_id}: {message}")]
    InvalidPage { page_id: String, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ForgeError {
    /// True for the rate-limit variant, which the orchestrator handles with
    /// a single wait-and-retry before recording a block failure.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ForgeError::RateLimited { .. })
    }

    /// Seconds the upstream asked us to wait, if this is a rate-limit error.
    pub fn retry_after_hint(&self) -> Option<u64> {
        match self {
            ForgeError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
