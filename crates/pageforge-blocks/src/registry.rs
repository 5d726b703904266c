// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static block registry.
//!
//! Maps each [`BlockKind`] to its prompt template, expected response shape,
//! image slots, and schema defaults, replacing string-keyed dispatch with a
//! compile-time-exhaustive lookup.

use pageforge_core::ForgeError;
use serde_json::json;
use strum::IntoEnumIterator;

use crate::kind::BlockKind;

/// How the provider's response body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Strict JSON object (optionally fenced in a code block).
    Json,
    /// JSON preferred; long-form plain text is accepted as a fallback and
    /// lands in the first required key.
    JsonOrText,
}

/// Everything the generator needs to produce one block.
#[derive(Debug, Clone)]
pub struct BlockDefinition {
    pub kind: BlockKind,
    pub prompt_template: &'static str,
    /// Keys the parsed response must contain, non-empty.
    pub required_keys: &'static [&'static str],
    pub response_format: ResponseFormat,
    /// Image slots auto-assigned after a successful generation.
    pub image_slots: &'static [&'static str],
}

impl BlockDefinition {
    /// Built-in schema defaults for this block, the bottom layer of schema
    /// resolution.
    pub fn schema_defaults(&self) -> serde_json::Value {
        match self.kind {
            BlockKind::Metadata => json!({
                "seo_title": {"type": "text", "max_length": 60, "required": true,
                              "over_limit_action": "truncate", "must_contain_keyword": true},
                "meta_description": {"type": "text", "max_length": 155, "min_length": 70,
                                     "required": true, "over_limit_action": "truncate",
                                     "must_contain_keyword": true}
            }),
            BlockKind::Hero => json!({
                "headline": {"type": "text", "max_length": 70, "required": true,
                             "must_contain_keyword": true},
                "subheadline": {"type": "text", "max_length": 160}
            }),
            BlockKind::Intro => json!({
                "body": {"type": "html", "min_length": 200, "required": true,
                         "forbidden_patterns": ["lorem ipsum"]}
            }),
            BlockKind::Features => json!({
                "items": {"type": "json", "required": true}
            }),
            BlockKind::Steps => json!({
                "items": {"type": "json", "required": true}
            }),
            BlockKind::Benefits => json!({
                "items": {"type": "json", "required": true}
            }),
            BlockKind::Faq => json!({
                "items": {"type": "json", "required": true}
            }),
            BlockKind::Testimonials => json!({
                "items": {"type": "json"}
            }),
            BlockKind::Cta => json!({
                "headline": {"type": "text", "max_length": 60, "required": true,
                             "over_limit_action": "truncate"},
                "button_label": {"type": "text", "max_length": 25, "required": true,
                                 "over_limit_action": "truncate"}
            }),
            BlockKind::RelatedItems => json!({
                "items": {"type": "json"}
            }),
        }
    }
}

const METADATA: BlockDefinition = BlockDefinition {
    kind: BlockKind::Metadata,
    prompt_template: "You are writing SEO metadata for {{business_name}}, a business in \
        {{industry}}. Page: \"{{title}}\" (category: {{category}}). Focus keyword: \
        \"{{focus_keyword}}\". Tone: {{tone}}.\n\
        Respond with a JSON object: {\"seo_title\": string (max 60 chars, include the focus \
        keyword), \"meta_description\": string (70-155 chars, include the focus keyword), \
        \"focus_keyword\": string}.",
    required_keys: &["seo_title", "meta_description"],
    response_format: ResponseFormat::Json,
    image_slots: &[],
};

const HERO: BlockDefinition = BlockDefinition {
    kind: BlockKind::Hero,
    prompt_template: "Write the hero section for the page \"{{title}}\" ({{category}}) of \
        {{business_name}}. Audience: {{audience}}. Tone: {{tone}}. Focus keyword: \
        \"{{focus_keyword}}\".\n\
        Respond with a JSON object: {\"headline\": string (max 70 chars), \"subheadline\": \
        string (max 160 chars)}.",
    required_keys: &["headline"],
    response_format: ResponseFormat::Json,
    image_slots: &["hero_image"],
};

const INTRO: BlockDefinition = BlockDefinition {
    kind: BlockKind::Intro,
    prompt_template: "Write an engaging introduction (2-3 paragraphs) for the page \
        \"{{title}}\" in category {{category}} for {{business_name}} ({{industry}}). \
        Tone: {{tone}}. Work the focus keyword \"{{focus_keyword}}\" in naturally.\n\
        Respond with a JSON object: {\"body\": string (HTML paragraphs)}. Plain prose is \
        also acceptable.",
    required_keys: &["body"],
    response_format: ResponseFormat::JsonOrText,
    image_slots: &[],
};

const FEATURES: BlockDefinition = BlockDefinition {
    kind: BlockKind::Features,
    prompt_template: "List 4-6 notable features for \"{{title}}\" ({{category}}) at \
        {{business_name}}. Tone: {{tone}}.\n\
        Respond with a JSON object: {\"items\": [{\"title\": string, \"description\": \
        string}]}.",
    required_keys: &["items"],
    response_format: ResponseFormat::Json,
    image_slots: &[],
};

const STEPS: BlockDefinition = BlockDefinition {
    kind: BlockKind::Steps,
    prompt_template: "Describe the step-by-step process a customer follows for \
        \"{{title}}\" at {{business_name}}. Audience: {{audience}}. Tone: {{tone}}.\n\
        Respond with a JSON object: {\"items\": [{\"title\": string, \"description\": \
        string}]} with 3-5 steps.",
    required_keys: &["items"],
    response_format: ResponseFormat::Json,
    image_slots: &["step_image_1", "step_image_2", "step_image_3"],
};

const BENEFITS: BlockDefinition = BlockDefinition {
    kind: BlockKind::Benefits,
    prompt_template: "List 3-5 customer benefits of \"{{title}}\" ({{category}}) at \
        {{business_name}}. Tone: {{tone}}.\n\
        Respond with a JSON object: {\"items\": [{\"title\": string, \"description\": \
        string}]}.",
    required_keys: &["items"],
    response_format: ResponseFormat::Json,
    image_slots: &[],
};

const FAQ: BlockDefinition = BlockDefinition {
    kind: BlockKind::Faq,
    prompt_template: "Write 4-6 frequently asked questions with answers for \"{{title}}\" \
        ({{category}}) at {{business_name}}. Audience: {{audience}}. Tone: {{tone}}. \
        Mention \"{{focus_keyword}}\" where natural.\n\
        Respond with a JSON object: {\"items\": [{\"question\": string, \"answer\": \
        string}]}.",
    required_keys: &["items"],
    response_format: ResponseFormat::Json,
    image_slots: &[],
};

const TESTIMONIALS: BlockDefinition = BlockDefinition {
    kind: BlockKind::Testimonials,
    prompt_template: "Write 2-3 short, realistic customer testimonial placeholders for \
        \"{{title}}\" at {{business_name}}. Tone: {{tone}}.\n\
        Respond with a JSON object: {\"items\": [{\"quote\": string, \"author\": string}]}.",
    required_keys: &["items"],
    response_format: ResponseFormat::Json,
    image_slots: &[],
};

const CTA: BlockDefinition = BlockDefinition {
    kind: BlockKind::Cta,
    prompt_template: "Write a call-to-action for the page \"{{title}}\" of \
        {{business_name}}. Audience: {{audience}}. Tone: {{tone}}.\n\
        Respond with a JSON object: {\"headline\": string (max 60 chars), \
        \"button_label\": string (max 25 chars)}.",
    required_keys: &["headline", "button_label"],
    response_format: ResponseFormat::Json,
    image_slots: &[],
};

const RELATED_ITEMS: BlockDefinition = BlockDefinition {
    kind: BlockKind::RelatedItems,
    prompt_template: "Suggest 3-4 related catalog items a visitor of \"{{title}}\" \
        ({{category}}) at {{business_name}} might also want. Tone: {{tone}}.\n\
        Respond with a JSON object: {\"items\": [{\"title\": string, \"description\": \
        string}]}.",
    required_keys: &["items"],
    response_format: ResponseFormat::Json,
    image_slots: &[],
};

/// Look up the static definition for a block kind.
pub fn definition(kind: BlockKind) -> &'static BlockDefinition {
    match kind {
        BlockKind::Metadata => &METADATA,
        BlockKind::Hero => &HERO,
        BlockKind::Intro => &INTRO,
        BlockKind::Features => &FEATURES,
        BlockKind::Steps => &STEPS,
        BlockKind::Benefits => &BENEFITS,
        BlockKind::Faq => &FAQ,
        BlockKind::Testimonials => &TESTIMONIALS,
        BlockKind::Cta => &CTA,
        BlockKind::RelatedItems => &RELATED_ITEMS,
    }
}

/// The full default block order. Metadata is first; everything else follows
/// declaration order.
pub fn default_order() -> Vec<BlockKind> {
    BlockKind::iter().collect()
}

/// Resolve the block list for one job.
///
/// Precedence: explicit selection, then a stored custom order, then the full
/// default order. The metadata block is always forced to run first
/// regardless of the source list.
pub fn resolve_order(
    selection: Option<&[String]>,
    stored_order: Option<&[String]>,
) -> Result<Vec<BlockKind>, ForgeError> {
    let mut order = match (selection, stored_order) {
        (Some(selected), _) => parse_kinds(selected)?,
        (None, Some(stored)) => parse_kinds(stored)?,
        (None, None) => default_order(),
    };

    let mut seen = std::collections::HashSet::new();
    order.retain(|kind| seen.insert(*kind));
    if let Some(pos) = order.iter().position(|k| *k == BlockKind::Metadata) {
        order.remove(pos);
    }
    order.insert(0, BlockKind::Metadata);
    Ok(order)
}

fn parse_kinds(names: &[String]) -> Result<Vec<BlockKind>, ForgeError> {
    names.iter().map(|name| BlockKind::parse(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_definition_with_required_keys() {
        for kind in BlockKind::iter() {
            let def = definition(kind);
            assert_eq!(def.kind, kind);
            assert!(!def.prompt_template.is_empty());
            // Metadata is the shape anchor; all kinds name at least one key
            // except purely optional ones, which we do not have.
            assert!(!def.required_keys.is_empty(), "{kind} has no required keys");
        }
    }

    #[test]
    fn schema_defaults_parse_as_schemas() {
        for kind in BlockKind::iter() {
            let defaults = definition(kind).schema_defaults();
            assert!(
                defaults.is_object(),
                "{kind} schema defaults are not an object"
            );
        }
    }

    #[test]
    fn default_order_starts_with_metadata() {
        let order = default_order();
        assert_eq!(order[0], BlockKind::Metadata);
        assert_eq!(order.len(), 10);
    }

    #[test]
    fn explicit_selection_wins_and_metadata_is_forced_first() {
        let selection = vec!["faq".to_string(), "hero".to_string()];
        let stored = vec!["cta".to_string()];
        let order = resolve_order(Some(&selection), Some(&stored)).unwrap();
        assert_eq!(
            order,
            vec![BlockKind::Metadata, BlockKind::Faq, BlockKind::Hero]
        );
    }

    #[test]
    fn stored_order_is_used_without_selection() {
        let stored = vec![
            "metadata".to_string(),
            "cta".to_string(),
            "hero".to_string(),
        ];
        let order = resolve_order(None, Some(&stored)).unwrap();
        assert_eq!(
            order,
            vec![BlockKind::Metadata, BlockKind::Cta, BlockKind::Hero]
        );
    }

    #[test]
    fn metadata_not_duplicated_when_selected_late() {
        let selection = vec!["hero".to_string(), "metadata".to_string()];
        let order = resolve_order(Some(&selection), None).unwrap();
        assert_eq!(order, vec![BlockKind::Metadata, BlockKind::Hero]);
    }

    #[test]
    fn unknown_block_in_selection_errors() {
        let selection = vec!["sidebar".to_string()];
        let err = resolve_order(Some(&selection), None).unwrap_err();
        assert!(matches!(err, ForgeError::UnknownBlockType(_)));
    }

    #[test]
    fn hero_and_steps_declare_image_slots() {
        assert_eq!(definition(BlockKind::Hero).image_slots, &["hero_image"]);
        assert_eq!(definition(BlockKind::Steps).image_slots.len(), 3);
        assert!(definition(BlockKind::Faq).image_slots.is_empty());
    }
}
