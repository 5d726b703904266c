// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tag extraction and slug normalization for image matching.

use pageforge_core::PageFields;

/// Slugify a phrase: lowercase, non-alphanumeric runs collapse to single
/// hyphens, no leading or trailing hyphen.
pub fn slugify(phrase: &str) -> String {
    let mut slug = String::with_capacity(phrase.len());
    let mut pending_hyphen = false;
    for c in phrase.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

fn push_words(out: &mut Vec<String>, phrase: &str) {
    for word in phrase.split(|c: char| c.is_whitespace() || c == '-' || c == '_') {
        let word = word.to_lowercase();
        if word.chars().count() >= 3 && !out.contains(&word) {
            out.push(word);
        }
    }
}

/// Candidate tag words for the matching cascade, extracted from the focus
/// keyword, topic, and category in that order. Lowercase, at least three
/// characters, deduplicated, original order preserved.
pub fn extract_tags(fields: &PageFields) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(keyword) = &fields.focus_keyword {
        push_words(&mut tags, keyword);
    }
    if let Some(topic) = &fields.topic {
        push_words(&mut tags, topic);
    }
    push_words(&mut tags, &fields.category);
    tags
}

/// Raw candidate phrases for the folder tier, highest priority first.
pub fn folder_phrases(fields: &PageFields) -> Vec<String> {
    let mut phrases: Vec<String> = fields.potential_folders.clone();
    if let Some(keyword) = &fields.focus_keyword {
        phrases.push(keyword.clone());
    }
    if let Some(topic) = &fields.topic {
        phrases.push(topic.clone());
    }
    phrases.push(fields.category.clone());
    phrases.retain(|p| !p.trim().is_empty());
    phrases
}
