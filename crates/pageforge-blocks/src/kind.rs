// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block type identifiers.

use pageforge_core::ForgeError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// One named content section of a catalog page.
///
/// Each kind has its own prompt template, response parser, and schema
/// defaults in the registry. The string form is the stable identifier used
/// in queue rows, stored block orders, and the generation log.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// SEO title, meta description, and focus keyword. Always runs first.
    Metadata,
    Hero,
    Intro,
    Features,
    Steps,
    Benefits,
    Faq,
    Testimonials,
    Cta,
    RelatedItems,
}

impl BlockKind {
    /// Parse a stored identifier, mapping unknown strings to a typed error.
    pub fn parse(s: &str) -> Result<Self, ForgeError> {
        s.parse()
            .map_err(|_| ForgeError::UnknownBlockType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_snake_case() {
        assert_eq!(BlockKind::RelatedItems.to_string(), "related_items");
        assert_eq!(BlockKind::parse("related_items").unwrap(), BlockKind::RelatedItems);
        assert_eq!(BlockKind::parse("faq").unwrap(), BlockKind::Faq);
    }

    #[test]
    fn unknown_kind_is_typed_error() {
        let err = BlockKind::parse("sidebar").unwrap_err();
        assert!(matches!(err, ForgeError::UnknownBlockType(s) if s == "sidebar"));
    }
}
