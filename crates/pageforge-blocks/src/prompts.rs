// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt template rendering.
//!
//! Templates use `{{variable}}` placeholders filled from a merged context of
//! page fields, the business profile, and per-call extras. Unknown
//! placeholders render as empty strings so a sparse page never leaks raw
//! `{{...}}` markers into a prompt.

use std::collections::BTreeMap;

use pageforge_config::ProfileConfig;
use pageforge_core::PageFields;

/// Merged template context. Later sources win on key collisions.
pub fn build_context(
    fields: &PageFields,
    profile: &ProfileConfig,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut context = BTreeMap::new();

    context.insert("business_name".to_string(), profile.business_name.clone());
    context.insert("industry".to_string(), profile.industry.clone());
    context.insert("tone".to_string(), profile.tone.clone());
    context.insert("audience".to_string(), profile.audience.clone());

    context.insert("title".to_string(), fields.title.clone());
    context.insert("category".to_string(), fields.category.clone());
    context.insert(
        "focus_keyword".to_string(),
        fields.focus_keyword.clone().unwrap_or_default(),
    );
    context.insert(
        "topic".to_string(),
        fields.topic.clone().unwrap_or_default(),
    );
    for (key, value) in &fields.extra {
        context.insert(key.clone(), value.clone());
    }

    for (key, value) in extra {
        context.insert(key.clone(), value.clone());
    }

    context
}

/// Substitute `{{key}}` placeholders in a template.
pub fn render(template: &str, context: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some(value) = context.get(key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated placeholder, emit the remainder as-is.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
