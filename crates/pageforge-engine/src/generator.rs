// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block content generator.
//!
//! One call generates one block: budget check, prompt rendering, provider
//! call, parsing, schema validation with auto-fix, persistence, ledger
//! entry, and image auto-assignment for blocks that declare image slots.
//! Related-item cards additionally get a generated illustration from the
//! image cache. Every attempt leaves a generation_log row, success or
//! failure.

use std::collections::BTreeMap;
use std::sync::Arc;

use pageforge_blocks::{build_context, definition, parse_response, render, BlockKind};
use pageforge_config::PageforgeConfig;
use pageforge_core::{
    CmsAdapter, ForgeError, GenerationOptions, ImageProvider, PageFields, PageId, TextProvider,
    TokenUsage,
};
use pageforge_cost::{calculate_cost, get_pricing, CostTracker, GenerationEntry};
use pageforge_images::{assign_image_with_metadata, find_matching_image, ImageGenerator};
use pageforge_schema::{auto_fix, resolve_schema, validate_block};
use pageforge_storage::{queries::settings, Database};
use tracing::{debug, warn};

/// Settings key prefix for stored per-block schema overrides.
const SCHEMA_OVERRIDE_PREFIX: &str = "schema_profile_";

/// Result of one successful block generation.
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub kind: BlockKind,
    pub slots: BTreeMap<String, String>,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub model: String,
}

pub struct BlockGenerator {
    db: Arc<Database>,
    cms: Arc<dyn CmsAdapter>,
    text: Arc<dyn TextProvider>,
    images: Arc<dyn ImageProvider>,
    image_gen: ImageGenerator,
    tracker: Arc<CostTracker>,
    config: PageforgeConfig,
}

impl BlockGenerator {
    pub fn new(
        db: Arc<Database>,
        cms: Arc<dyn CmsAdapter>,
        text: Arc<dyn TextProvider>,
        images: Arc<dyn ImageProvider>,
        tracker: Arc<CostTracker>,
        config: PageforgeConfig,
    ) -> Self {
        let image_gen = ImageGenerator::new(Arc::clone(&db));
        Self {
            db,
            cms,
            text,
            images,
            image_gen,
            tracker,
            config,
        }
    }

    /// Generate one block for a page.
    ///
    /// Success and failure are both recorded in the generation log; image
    /// auto-assignment runs after a success for blocks with image slots.
    pub async fn generate_block(
        &self,
        page: &PageId,
        kind: BlockKind,
        fields: &PageFields,
        extra: &BTreeMap<String, String>,
        user_id: Option<&str>,
    ) -> Result<BlockOutcome, ForgeError> {
        match self.try_generate(page, kind, fields, extra).await {
            Ok(mut outcome) => {
                self.tracker
                    .record(&GenerationEntry::success(
                        page,
                        &kind.to_string(),
                        &outcome.usage,
                        outcome.cost_usd,
                        &outcome.model,
                        user_id.map(str::to_string),
                    ))
                    .await?;
                if kind == BlockKind::RelatedItems {
                    self.attach_card_images(page, fields, &mut outcome.slots)
                        .await;
                }
                self.assign_images(page, kind, fields).await;
                Ok(outcome)
            }
            Err(e) => {
                self.tracker
                    .record(&GenerationEntry::failure(
                        page,
                        &kind.to_string(),
                        &self.config.openai.default_model,
                        &e.to_string(),
                        user_id.map(str::to_string),
                    ))
                    .await?;
                Err(e)
            }
        }
    }

    async fn try_generate(
        &self,
        page: &PageId,
        kind: BlockKind,
        fields: &PageFields,
        extra: &BTreeMap<String, String>,
    ) -> Result<BlockOutcome, ForgeError> {
        self.tracker.check_budget().await?;

        let def = definition(kind);
        let context = build_context(fields, &self.config.profile, extra);
        let prompt = render(def.prompt_template, &context);

        let options = GenerationOptions {
            max_tokens: self.config.openai.max_tokens,
            ..Default::default()
        };
        let generation = self.text.generate(&prompt, &options).await?;
        let mut slots = parse_response(def, &generation.content)?;

        // Stored profile overrides sit on top of the built-in defaults;
        // per-template overrides are not used by the background pipeline.
        let profile_overrides = settings::get(
            &self.db,
            &format!("{SCHEMA_OVERRIDE_PREFIX}{kind}"),
        )
        .await?
        .map(|raw| {
            serde_json::from_str::<serde_json::Value>(&raw).map_err(|e| {
                ForgeError::Config(format!("stored schema override for '{kind}' is invalid: {e}"))
            })
        })
        .transpose()?;

        let schema = resolve_schema(&def.schema_defaults(), profile_overrides.as_ref(), None)?;

        let fixed = auto_fix(&kind.to_string(), &mut slots, &schema);
        if !fixed.fixed.is_empty() {
            debug!(page_id = %page, block = %kind, slots = ?fixed.fixed, "over-limit slots truncated");
        }
        for issue in validate_block(
            &kind.to_string(),
            &slots,
            &schema,
            fields.focus_keyword.as_deref(),
        ) {
            warn!(
                page_id = %page,
                block = %kind,
                slot = %issue.slot_name,
                rule = %issue.rule,
                severity = %issue.severity,
                "{}", issue.message
            );
        }

        let slots_value = serde_json::to_value(&slots)
            .map_err(|e| ForgeError::Internal(format!("slot serialization: {e}")))?;
        self.cms
            .set_block_content(page, &kind.to_string(), &slots_value)
            .await?;

        let cost_usd = calculate_cost(&generation.usage, &get_pricing(&generation.model));

        Ok(BlockOutcome {
            kind,
            slots,
            usage: generation.usage,
            cost_usd,
            model: generation.model,
        })
    }

    /// Best-effort image auto-assignment. The block's content is already
    /// persisted, so a matching failure downgrades to a warning.
    async fn assign_images(&self, page: &PageId, kind: BlockKind, fields: &PageFields) {
        let def = definition(kind);
        for slot in def.image_slots {
            let matched = match find_matching_image(
                self.cms.as_ref(),
                fields,
                self.config.images.default_image_id.as_deref(),
            )
            .await
            {
                Ok(matched) => matched,
                Err(e) => {
                    warn!(page_id = %page, slot, error = %e, "image matching failed");
                    continue;
                }
            };
            let Some(image) = matched else {
                debug!(page_id = %page, slot, "no image matched");
                continue;
            };
            if let Err(e) = assign_image_with_metadata(
                self.cms.as_ref(),
                self.text.as_ref(),
                &self.config.images,
                &image,
                page,
                slot,
                fields,
            )
            .await
            {
                warn!(page_id = %page, slot, image = %image, error = %e, "image assignment failed");
            }
        }
    }

    /// Attach a cached or freshly generated illustration to every related
    /// item card and re-persist the block. Best-effort: the block's text
    /// content is already stored, so a failed card image downgrades to a
    /// warning and the card ships without one.
    async fn attach_card_images(
        &self,
        page: &PageId,
        fields: &PageFields,
        slots: &mut BTreeMap<String, String>,
    ) {
        let Some(raw) = slots.get("items") else {
            return;
        };
        let mut items: Vec<serde_json::Value> = match serde_json::from_str(raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(page_id = %page, error = %e, "related items are not a JSON array, skipping card images");
                return;
            }
        };

        let mut changed = false;
        for item in &mut items {
            let Some(title) = item
                .get("title")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
            else {
                continue;
            };
            match self
                .image_gen
                .find_or_generate(
                    self.cms.as_ref(),
                    self.text.as_ref(),
                    self.images.as_ref(),
                    &self.tracker,
                    &self.config.images,
                    page,
                    &title,
                    &fields.category,
                )
                .await
            {
                Ok(attachment) => {
                    item["image"] = serde_json::Value::String(attachment.0);
                    changed = true;
                }
                Err(e) => {
                    warn!(page_id = %page, item = %title, error = %e, "card image generation failed");
                }
            }
        }
        if !changed {
            return;
        }

        let Ok(encoded) = serde_json::to_string(&items) else {
            return;
        };
        slots.insert("items".to_string(), encoded);
        let Ok(value) = serde_json::to_value(&slots) else {
            return;
        };
        if let Err(e) = self
            .cms
            .set_block_content(page, &BlockKind::RelatedItems.to_string(), &value)
            .await
        {
            warn!(page_id = %page, error = %e, "failed to re-persist related items with card images");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageforge_config::CostConfig;
    use pageforge_core::TracingNotifier;
    use pageforge_cost::LogStatus;
    use pageforge_test_utils::{MockCms, MockImageProvider, MockTextProvider};

    struct Fixture {
        generator: BlockGenerator,
        cms: Arc<MockCms>,
        text: Arc<MockTextProvider>,
        images: Arc<MockImageProvider>,
        tracker: Arc<CostTracker>,
    }

    async fn fixture(config: PageforgeConfig) -> Fixture {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let cms = Arc::new(MockCms::new());
        let text = Arc::new(MockTextProvider::new());
        let images = Arc::new(MockImageProvider::new());
        let tracker = Arc::new(CostTracker::new(
            Arc::clone(&db),
            config.cost.clone(),
            Arc::new(TracingNotifier),
        ));
        let generator = BlockGenerator::new(
            db,
            Arc::clone(&cms) as Arc<dyn CmsAdapter>,
            Arc::clone(&text) as Arc<dyn TextProvider>,
            Arc::clone(&images) as Arc<dyn ImageProvider>,
            Arc::clone(&tracker),
            config,
        );
        Fixture {
            generator,
            cms,
            text,
            images,
            tracker,
        }
    }

    fn fields() -> PageFields {
        PageFields {
            title: "Engagement Rings".into(),
            category: "Rings".into(),
            focus_keyword: Some("engagement rings".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn success_persists_content_and_logs() {
        let f = fixture(PageforgeConfig::default()).await;
        f.cms.add_page("p1", "catalog_page", fields());
        f.text
            .push_text(r#"{"headline": "Handcrafted Engagement Rings", "subheadline": "Made for you"}"#);

        let page = PageId("p1".into());
        let outcome = f
            .generator
            .generate_block(&page, BlockKind::Hero, &fields(), &BTreeMap::new(), Some("u1"))
            .await
            .unwrap();

        assert_eq!(outcome.slots["headline"], "Handcrafted Engagement Rings");
        assert!(outcome.cost_usd > 0.0);

        let stored = f.cms.block_content("p1", "hero").unwrap();
        assert_eq!(stored["headline"], "Handcrafted Engagement Rings");

        let entries = f.tracker.ledger().recent(1).await.unwrap();
        assert_eq!(entries[0].status, LogStatus::Success);
        assert_eq!(entries[0].block_type, "hero");
        assert_eq!(entries[0].user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn unparseable_response_logs_failure() {
        let f = fixture(PageforgeConfig::default()).await;
        f.cms.add_page("p1", "catalog_page", fields());
        f.text.push_text("not json at all");

        let page = PageId("p1".into());
        let err = f
            .generator
            .generate_block(&page, BlockKind::Hero, &fields(), &BTreeMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidResponse(_)));

        // Nothing persisted, failure logged with zero cost.
        assert!(f.cms.block_content("p1", "hero").is_none());
        let entries = f.tracker.ledger().recent(1).await.unwrap();
        assert_eq!(entries[0].status, LogStatus::Failed);
        assert!((entries[0].cost_usd - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn budget_exceeded_blocks_before_provider_call() {
        let config = PageforgeConfig {
            cost: CostConfig {
                monthly_budget_usd: 0.000001,
                ..Default::default()
            },
            ..Default::default()
        };
        let f = fixture(config).await;
        f.cms.add_page("p1", "catalog_page", fields());

        // Prior spend puts us over the tiny budget.
        f.tracker
            .record(&GenerationEntry::success(
                &PageId("p0".into()),
                "hero",
                &TokenUsage {
                    prompt_tokens: 1000,
                    completion_tokens: 1000,
                    total_tokens: 2000,
                },
                1.0,
                "gpt-4o",
                None,
            ))
            .await
            .unwrap();

        let page = PageId("p1".into());
        let err = f
            .generator
            .generate_block(&page, BlockKind::Hero, &fields(), &BTreeMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::BudgetExceeded { .. }));
        assert_eq!(f.text.call_count(), 0);
    }

    #[tokio::test]
    async fn truncate_schema_fixes_overlong_metadata() {
        let f = fixture(PageforgeConfig::default()).await;
        f.cms.add_page("p1", "catalog_page", fields());
        let long_title = "Engagement rings ".repeat(10);
        f.text.push_text(&format!(
            r#"{{"seo_title": "{}", "meta_description": "Browse our engagement rings, handmade in our studio with certified stones and a lifetime guarantee."}}"#,
            long_title.trim()
        ));

        let page = PageId("p1".into());
        let outcome = f
            .generator
            .generate_block(&page, BlockKind::Metadata, &fields(), &BTreeMap::new(), None)
            .await
            .unwrap();

        // Metadata defaults truncate seo_title at 60 characters.
        assert_eq!(outcome.slots["seo_title"].chars().count(), 60);
    }

    #[tokio::test]
    async fn related_items_get_generated_card_images() {
        let f = fixture(PageforgeConfig::default()).await;
        f.cms.add_page("p1", "catalog_page", fields());
        let items_json =
            r#"{"items": [{"title": "Wedding Bands", "description": "Matching bands."}]}"#;
        f.text.push_text(items_json);
        // Prompt-optimization response for the card illustration.
        f.text.push_text("studio photo of matching wedding bands");
        f.images.push_bytes(b"png");

        let page = PageId("p1".into());
        let outcome = f
            .generator
            .generate_block(
                &page,
                BlockKind::RelatedItems,
                &fields(),
                &BTreeMap::new(),
                None,
            )
            .await
            .unwrap();

        let items: serde_json::Value = serde_json::from_str(&outcome.slots["items"]).unwrap();
        let image_id = items[0]["image"].as_str().unwrap().to_string();
        assert!(image_id.starts_with("upload-"), "got {image_id}");

        // The persisted block carries the card image too.
        let stored = f.cms.block_content("p1", "related_items").unwrap();
        let stored_items: serde_json::Value =
            serde_json::from_str(stored["items"].as_str().unwrap()).unwrap();
        assert_eq!(stored_items[0]["image"].as_str(), Some(image_id.as_str()));

        // The fixed image charge sits in the ledger next to the block entry.
        let entries = f.tracker.ledger().recent(2).await.unwrap();
        assert!(entries.iter().any(|e| e.block_type == "image_generation"));

        // The same card on a later run is served from the cache.
        f.text.push_text(items_json);
        f.generator
            .generate_block(
                &page,
                BlockKind::RelatedItems,
                &fields(),
                &BTreeMap::new(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(f.images.call_count(), 1);
    }

    #[tokio::test]
    async fn hero_success_assigns_matched_image() {
        let f = fixture(PageforgeConfig::default()).await;
        f.cms.add_page("p1", "catalog_page", fields());
        f.cms.add_attachment("img-1", &["engagement", "rings"], true);
        f.text
            .push_text(r#"{"headline": "Engagement Rings", "subheadline": "x"}"#);
        // Second scripted response feeds the alt text call.
        f.text.push_text("A gold engagement ring on white background");

        let page = PageId("p1".into());
        f.generator
            .generate_block(&page, BlockKind::Hero, &fields(), &BTreeMap::new(), None)
            .await
            .unwrap();

        assert_eq!(f.cms.attached_image("p1", "hero_image").as_deref(), Some("img-1"));
        assert!(f.cms.alt_text("img-1").is_some());
    }
}
