// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context hashing for the image generation cache.

use sha2::{Digest, Sha256};

/// Stable fingerprint of a normalized (title, category) pair.
///
/// Both inputs are trimmed and lowercased, joined with `|`, and hashed with
/// SHA-256. Identical content with different casing or whitespace produces
/// the same key.
pub fn context_hash(title: &str, category: &str) -> String {
    let normalized = format!(
        "{}|{}",
        title.trim().to_lowercase(),
        category.trim().to_lowercase()
    );
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
