// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema model for block content slots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What to do when a slot value exceeds its `max_length`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OverLimitAction {
    /// Hard-truncate the value to `max_length` during auto-fix.
    Truncate,
    /// Report the overage and leave the value untouched.
    #[default]
    Flag,
    /// Accepted in schemas but treated identically to `Flag`; true
    /// regeneration is a documented limitation.
    Regenerate,
}

/// Constraints for a single named slot within a block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotRule {
    /// Slot value type, e.g. "text" or "html". Informational only.
    #[serde(rename = "type")]
    pub slot_type: String,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// An empty value is an error-severity issue.
    pub required: bool,
    pub over_limit_action: OverLimitAction,
    /// Substrings that must not appear (case-insensitive).
    pub forbidden_patterns: Vec<String>,
    /// The page's focus keyword must appear in the value.
    pub must_contain_keyword: bool,
}

/// Per-block-type schema: a map from slot name to its rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockSchema {
    pub slots: BTreeMap<String, SlotRule>,
}

impl BlockSchema {
    pub fn rule(&self, slot: &str) -> Option<&SlotRule> {
        self.slots.get(slot)
    }
}
