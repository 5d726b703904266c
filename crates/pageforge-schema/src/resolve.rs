// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Three-layer schema resolution.
//!
//! A block's effective schema is built from compiled defaults, then stored
//! profile overrides, then optional per-template overrides. Later layers win;
//! object-valued keys deep-merge, array-valued keys replace wholesale.

use pageforge_core::ForgeError;
use serde_json::Value;

use crate::model::BlockSchema;

/// Merge `overlay` into `base`. Objects merge key-by-key, everything else
/// (arrays included) replaces the base value.
pub fn merge_layer(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        merge_layer(base_value, overlay_value);
                    }
                    _ => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Resolve a block's effective schema from its three layers.
pub fn resolve_schema(
    defaults: &Value,
    profile_overrides: Option<&Value>,
    template_overrides: Option<&Value>,
) -> Result<BlockSchema, ForgeError> {
    let mut merged = defaults.clone();
    if let Some(profile) = profile_overrides {
        merge_layer(&mut merged, profile);
    }
    if let Some(template) = template_overrides {
        merge_layer(&mut merged, template);
    }
    serde_json::from_value(merged)
        .map_err(|e| ForgeError::Config(format!("invalid block schema after merge: {e}")))
}
