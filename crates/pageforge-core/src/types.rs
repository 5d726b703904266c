// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Pageforge pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque foreign key to a page record in the host CMS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub String);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque foreign key to an attachment in the host media library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub String);

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a queued generation job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Token counts reported by the text provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Options for a single text generation call.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Model override. `None` uses the client's default model.
    pub model: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional system prompt.
    pub system: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 2048,
            temperature: 0.7,
            system: None,
        }
    }
}

/// The result of a single text generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Raw text content returned by the provider.
    pub content: String,
    /// Token counts for cost calculation.
    pub usage: TokenUsage,
    /// Model that actually served the request.
    pub model: String,
}

/// Structured fields of the target page used to build prompt context and
/// image-matching tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFields {
    pub title: String,
    pub category: String,
    /// SEO focus keyword for the page, if one is set.
    pub focus_keyword: Option<String>,
    /// Free-form topic phrase, if one is set.
    pub topic: Option<String>,
    /// Candidate media-folder phrases for the image matcher's folder tier.
    pub potential_folders: Vec<String>,
    /// Any additional fields exposed to prompt templates.
    pub extra: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn job_status_round_trips_lowercase() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            let s = status.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(JobStatus::from_str(&s).unwrap(), status);
        }
    }

    #[test]
    fn job_status_serde_matches_display() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let parsed: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, JobStatus::Failed);
    }

    #[test]
    fn page_id_display() {
        let id = PageId("page-7".into());
        assert_eq!(id.to_string(), "page-7");
    }

    #[test]
    fn generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!(opts.model.is_none());
        assert_eq!(opts.max_tokens, 2048);
    }
}
