// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auto-fix pass for over-limit slot values.
//!
//! Only `truncate` is actually fixable: the value is hard-truncated to
//! exactly `max_length` characters. `flag` and `regenerate` leave the value
//! untouched and surface as remaining issues for human review.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{BlockSchema, OverLimitAction};
use crate::validate::{Severity, ValidationIssue};

/// Outcome of one auto-fix pass over a block's slot values.
#[derive(Debug, Clone, Default)]
pub struct AutoFixOutcome {
    /// Slot names whose values were truncated.
    pub fixed: Vec<String>,
    /// Over-limit issues that auto-fix could not resolve.
    pub remaining_issues: Vec<ValidationIssue>,
}

/// Fix over-limit slots in place according to their `over_limit_action`.
pub fn auto_fix(
    block_id: &str,
    slot_values: &mut BTreeMap<String, String>,
    schema: &BlockSchema,
) -> AutoFixOutcome {
    let mut outcome = AutoFixOutcome::default();

    for (slot, rule) in &schema.slots {
        let Some(max) = rule.max_length else {
            continue;
        };
        let Some(value) = slot_values.get_mut(slot) else {
            continue;
        };
        let length = value.chars().count();
        if length <= max {
            continue;
        }

        match rule.over_limit_action {
            OverLimitAction::Truncate => {
                *value = value.chars().take(max).collect();
                debug!(block_id, slot, from = length, to = max, "slot truncated");
                outcome.fixed.push(slot.clone());
            }
            OverLimitAction::Flag | OverLimitAction::Regenerate => {
                outcome.remaining_issues.push(ValidationIssue {
                    block_id: block_id.to_string(),
                    slot_name: slot.clone(),
                    severity: Severity::Error,
                    rule: "max_length".to_string(),
                    message: format!(
                        "slot '{slot}' is {length} characters, maximum is {max}; needs review"
                    ),
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlotRule;

    fn schema_with(action: OverLimitAction, max: usize) -> BlockSchema {
        BlockSchema {
            slots: [(
                "headline".to_string(),
                SlotRule {
                    max_length: Some(max),
                    over_limit_action: action,
                    ..Default::default()
                },
            )]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn truncation_is_exact() {
        let schema = schema_with(OverLimitAction::Truncate, 10);
        let mut values: BTreeMap<String, String> =
            [("headline".to_string(), "a".repeat(37))].into_iter().collect();

        let outcome = auto_fix("hero", &mut values, &schema);

        assert_eq!(values["headline"].chars().count(), 10);
        assert_eq!(outcome.fixed, vec!["headline"]);
        assert!(outcome.remaining_issues.is_empty());
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let schema = schema_with(OverLimitAction::Truncate, 3);
        let mut values: BTreeMap<String, String> =
            [("headline".to_string(), "ééééé".to_string())].into_iter().collect();

        auto_fix("hero", &mut values, &schema);
        assert_eq!(values["headline"], "ééé");
    }

    #[test]
    fn flag_leaves_value_untouched() {
        let schema = schema_with(OverLimitAction::Flag, 5);
        let mut values: BTreeMap<String, String> =
            [("headline".to_string(), "far too long".to_string())].into_iter().collect();

        let outcome = auto_fix("hero", &mut values, &schema);

        assert_eq!(values["headline"], "far too long");
        assert!(outcome.fixed.is_empty());
        assert_eq!(outcome.remaining_issues.len(), 1);
    }

    #[test]
    fn regenerate_degrades_to_flag() {
        let schema = schema_with(OverLimitAction::Regenerate, 5);
        let mut values: BTreeMap<String, String> =
            [("headline".to_string(), "far too long".to_string())].into_iter().collect();

        let outcome = auto_fix("hero", &mut values, &schema);

        assert_eq!(values["headline"], "far too long");
        assert_eq!(outcome.remaining_issues.len(), 1);
    }

    #[test]
    fn within_limit_is_untouched() {
        let schema = schema_with(OverLimitAction::Truncate, 50);
        let mut values: BTreeMap<String, String> =
            [("headline".to_string(), "fine".to_string())].into_iter().collect();

        let outcome = auto_fix("hero", &mut values, &schema);

        assert_eq!(values["headline"], "fine");
        assert!(outcome.fixed.is_empty());
        assert!(outcome.remaining_issues.is_empty());
    }
}
