// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot-level validation against a resolved block schema.
//!
//! Issues come in two severities: `error` blocks publish, `warning` is
//! advisory. A required-but-empty slot short-circuits all other rules for
//! that slot. Lengths are measured in characters, not bytes.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::Display;

use crate::model::{BlockSchema, OverLimitAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One rule violation found during validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub block_id: String,
    pub slot_name: String,
    pub severity: Severity,
    /// Machine-readable rule tag, e.g. "required" or "max_length".
    pub rule: String,
    pub message: String,
}

/// Aggregated validation outcome for one or more blocks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Split raw issues by severity. `passed` is true iff there are no
    /// error-severity issues.
    pub fn from_issues(all: Vec<ValidationIssue>) -> Self {
        let (issues, warnings): (Vec<_>, Vec<_>) = all
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);
        Self {
            passed: issues.is_empty(),
            issues,
            warnings,
        }
    }
}

fn issue(
    block_id: &str,
    slot: &str,
    severity: Severity,
    rule: &str,
    message: String,
) -> ValidationIssue {
    ValidationIssue {
        block_id: block_id.to_string(),
        slot_name: slot.to_string(),
        severity,
        rule: rule.to_string(),
        message,
    }
}

/// Validate one block's slot values against its schema.
pub fn validate_block(
    block_id: &str,
    slot_values: &BTreeMap<String, String>,
    schema: &BlockSchema,
    focus_keyword: Option<&str>,
) -> Vec<ValidationIssue> {
    let mut found = Vec::new();

    for (slot, rule) in &schema.slots {
        let value = slot_values.get(slot).map(String::as_str).unwrap_or("");
        let trimmed = value.trim();

        if rule.required && trimmed.is_empty() {
            found.push(issue(
                block_id,
                slot,
                Severity::Error,
                "required",
                format!("slot '{slot}' is required but empty"),
            ));
            // No point measuring an empty value against the other rules.
            continue;
        }

        let length = value.chars().count();

        if let Some(max) = rule.max_length {
            if length > max {
                // A truncate-eligible overage is resolved by auto-fix, so it
                // only warns; any other action must block publish.
                let severity = if rule.over_limit_action == OverLimitAction::Truncate {
                    Severity::Warning
                } else {
                    Severity::Error
                };
                found.push(issue(
                    block_id,
                    slot,
                    severity,
                    "max_length",
                    format!("slot '{slot}' is {length} characters, maximum is {max}"),
                ));
            }
        }

        if let Some(min) = rule.min_length {
            if !trimmed.is_empty() && length < min {
                found.push(issue(
                    block_id,
                    slot,
                    Severity::Warning,
                    "min_length",
                    format!("slot '{slot}' is {length} characters, minimum is {min}"),
                ));
            }
        }

        let lower = value.to_lowercase();
        for pattern in &rule.forbidden_patterns {
            if !pattern.is_empty() && lower.contains(&pattern.to_lowercase()) {
                found.push(issue(
                    block_id,
                    slot,
                    Severity::Warning,
                    "forbidden_pattern",
                    format!("slot '{slot}' contains forbidden text '{pattern}'"),
                ));
            }
        }

        if rule.must_contain_keyword {
            if let Some(keyword) = focus_keyword {
                if !keyword.trim().is_empty() && !lower.contains(&keyword.to_lowercase()) {
                    found.push(issue(
                        block_id,
                        slot,
                        Severity::Warning,
                        "must_contain_keyword",
                        format!("slot '{slot}' does not mention the focus keyword '{keyword}'"),
                    ));
                }
            }
        }
    }

    found
}

/// Validate several blocks in page order and aggregate the outcome.
pub fn validate_page(
    blocks: &[(String, BTreeMap<String, String>, BlockSchema)],
    focus_keyword: Option<&str>,
) -> ValidationResult {
    let mut all = Vec::new();
    for (block_id, slot_values, schema) in blocks {
        all.extend(validate_block(block_id, slot_values, schema, focus_keyword));
    }
    ValidationResult::from_issues(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlotRule;

    fn schema(slots: Vec<(&str, SlotRule)>) -> BlockSchema {
        BlockSchema {
            slots: slots
                .into_iter()
                .map(|(name, rule)| (name.to_string(), rule))
                .collect(),
        }
    }

    fn values(pairs: Vec<(&str, &str)>) -> BTreeMap<String, String> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn required_empty_is_error_and_short_circuits() {
        let schema = schema(vec![(
            "headline",
            SlotRule {
                required: true,
                min_length: Some(10),
                must_contain_keyword: true,
                ..Default::default()
            },
        )]);
        let found = validate_block("hero", &values(vec![("headline", "  ")]), &schema, Some("rings"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Error);
        assert_eq!(found[0].rule, "required");
    }

    #[test]
    fn over_max_is_error_unless_truncate() {
        let flagged = schema(vec![(
            "headline",
            SlotRule {
                max_length: Some(5),
                over_limit_action: OverLimitAction::Flag,
                ..Default::default()
            },
        )]);
        let found = validate_block("hero", &values(vec![("headline", "too long")]), &flagged, None);
        assert_eq!(found[0].severity, Severity::Error);

        let truncated = schema(vec![(
            "headline",
            SlotRule {
                max_length: Some(5),
                over_limit_action: OverLimitAction::Truncate,
                ..Default::default()
            },
        )]);
        let found =
            validate_block("hero", &values(vec![("headline", "too long")]), &truncated, None);
        assert_eq!(found[0].severity, Severity::Warning);
    }

    #[test]
    fn regenerate_over_limit_is_error_severity() {
        let schema = schema(vec![(
            "headline",
            SlotRule {
                max_length: Some(5),
                over_limit_action: OverLimitAction::Regenerate,
                ..Default::default()
            },
        )]);
        let found = validate_block("hero", &values(vec![("headline", "too long")]), &schema, None);
        assert_eq!(found[0].severity, Severity::Error);
    }

    #[test]
    fn under_min_is_warning() {
        let schema = schema(vec![(
            "body",
            SlotRule {
                min_length: Some(100),
                ..Default::default()
            },
        )]);
        let found = validate_block("intro", &values(vec![("body", "short")]), &schema, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(found[0].rule, "min_length");
    }

    #[test]
    fn forbidden_pattern_is_case_insensitive_warning() {
        let schema = schema(vec![(
            "body",
            SlotRule {
                forbidden_patterns: vec!["Lorem Ipsum".into()],
                ..Default::default()
            },
        )]);
        let found = validate_block(
            "intro",
            &values(vec![("body", "some LOREM IPSUM filler")]),
            &schema,
            None,
        );
        assert_eq!(found[0].rule, "forbidden_pattern");
        assert_eq!(found[0].severity, Severity::Warning);
    }

    #[test]
    fn missing_keyword_is_warning_only_when_keyword_known() {
        let schema = schema(vec![(
            "headline",
            SlotRule {
                must_contain_keyword: true,
                ..Default::default()
            },
        )]);
        let vals = values(vec![("headline", "Beautiful jewelry")]);

        let found = validate_block("hero", &vals, &schema, Some("engagement rings"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule, "must_contain_keyword");

        // No keyword on the page: rule is skipped entirely.
        assert!(validate_block("hero", &vals, &schema, None).is_empty());
    }

    #[test]
    fn length_is_measured_in_characters() {
        let schema = schema(vec![(
            "headline",
            SlotRule {
                max_length: Some(4),
                over_limit_action: OverLimitAction::Truncate,
                ..Default::default()
            },
        )]);
        // Four characters, eight bytes.
        let found = validate_block("hero", &values(vec![("headline", "éééé")]), &schema, None);
        assert!(found.is_empty());
    }

    #[test]
    fn page_passes_iff_no_errors() {
        let warn_only = schema(vec![(
            "body",
            SlotRule {
                min_length: Some(100),
                ..Default::default()
            },
        )]);
        let result = validate_page(
            &[("intro".to_string(), values(vec![("body", "short")]), warn_only)],
            None,
        );
        assert!(result.passed);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.issues.is_empty());

        let required = schema(vec![(
            "headline",
            SlotRule {
                required: true,
                ..Default::default()
            },
        )]);
        let result = validate_page(&[("hero".to_string(), values(vec![]), required)], None);
        assert!(!result.passed);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn validation_result_serializes() {
        let result = ValidationResult::from_issues(vec![issue(
            "hero",
            "headline",
            Severity::Error,
            "required",
            "slot 'headline' is required but empty".into(),
        )]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["passed"], false);
        assert_eq!(json["issues"][0]["severity"], "error");
    }
}
