// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider response parsing.
//!
//! Providers are asked for JSON, often returned inside a Markdown code
//! fence. Fences are stripped, the object decoded, and required keys
//! checked. Long-form blocks with `ResponseFormat::JsonOrText` accept plain
//! prose as a fallback: the whole text lands in the first required key.

use std::collections::BTreeMap;

use pageforge_core::ForgeError;
use serde_json::Value;
use tracing::debug;

use crate::registry::{BlockDefinition, ResponseFormat};

/// Strip a surrounding Markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening fence line.
    match rest.split_once('\n') {
        Some((first_line, body)) if first_line.trim().chars().all(char::is_alphanumeric) => {
            body.trim()
        }
        _ => rest.trim(),
    }
}

fn value_to_slot_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a provider response into slot values for the given block.
///
/// Returns `ForgeError::InvalidResponse` naming the expected shape when the
/// body cannot be decoded or a required key is missing or empty.
pub fn parse_response(
    def: &BlockDefinition,
    raw: &str,
) -> Result<BTreeMap<String, String>, ForgeError> {
    let body = strip_code_fence(raw);

    let slots = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), value_to_slot_string(v)))
            .collect::<BTreeMap<_, _>>(),
        Ok(_) | Err(_) if def.response_format == ResponseFormat::JsonOrText => {
            // Semi-structured fallback: treat the whole response as the
            // block's primary slot.
            debug!(kind = %def.kind, "response not JSON, using text fallback");
            let primary = def.required_keys.first().copied().unwrap_or("body");
            [(primary.to_string(), body.to_string())].into_iter().collect()
        }
        Ok(other) => {
            return Err(ForgeError::InvalidResponse(format!(
                "block '{}' expected a JSON object with keys {:?}, got {}",
                def.kind,
                def.required_keys,
                json_type_name(&other)
            )))
        }
        Err(e) => {
            return Err(ForgeError::InvalidResponse(format!(
                "block '{}' expected a JSON object with keys {:?}: {e}",
                def.kind, def.required_keys
            )))
        }
    };

    for key in def.required_keys {
        let present = slots
            .get(*key)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(ForgeError::InvalidResponse(format!(
                "block '{}' response is missing required key '{key}' (expected keys {:?})",
                def.kind, def.required_keys
            )));
        }
    }

    Ok(slots)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
