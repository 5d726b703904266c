// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image matching, alt text, and the image generation cache.
//!
//! Matching walks a five-tier cascade over media-library tags; generation
//! is cached by a normalized context hash so identical (title, category)
//! pairs never pay for a second provider call.

pub mod alt_text;
pub mod gen_cache;
pub mod hash;
pub mod matcher;
pub mod tags;

pub use alt_text::{assign_image_with_metadata, fallback_alt_text};
pub use gen_cache::ImageGenerator;
pub use hash::context_hash;
pub use matcher::find_matching_image;
pub use tags::{extract_tags, slugify};
