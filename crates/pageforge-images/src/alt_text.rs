// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alt text generation and image assignment.
//!
//! Alt text is generated once per (image, context) pair and cached in
//! attachment metadata, so repeated assignments of the same image never
//! spend provider tokens twice. Any provider failure degrades to the
//! deterministic tag-based fallback.

use pageforge_config::ImageConfig;
use pageforge_core::{
    AttachmentId, CmsAdapter, ForgeError, GenerationOptions, PageFields, PageId, TextProvider,
};
use tracing::{debug, warn};

use crate::hash::context_hash;

/// Attachment meta key prefix for cached alt text.
const ALT_CACHE_PREFIX: &str = "pageforge_alt_";

/// Deterministic alt text built from the page fields, used when AI alt text
/// is disabled or the provider call fails.
pub fn fallback_alt_text(fields: &PageFields) -> String {
    let title = fields.title.trim();
    let category = fields.category.trim();
    match (title.is_empty(), category.is_empty()) {
        (false, false) => format!("{title} - {category}"),
        (false, true) => title.to_string(),
        (true, false) => category.to_string(),
        (true, true) => "Catalog image".to_string(),
    }
}

async fn ai_alt_text(
    cms: &dyn CmsAdapter,
    provider: &dyn TextProvider,
    image: &AttachmentId,
    fields: &PageFields,
) -> Result<String, ForgeError> {
    let cache_key = format!(
        "{ALT_CACHE_PREFIX}{}",
        context_hash(&fields.title, &fields.category)
    );
    if let Some(cached) = cms.get_attachment_meta(image, &cache_key).await? {
        debug!(image = %image, "alt text cache hit");
        return Ok(cached);
    }

    let prompt = format!(
        "Write concise, descriptive image alt text (max 120 characters, no quotes) for an \
         image illustrating \"{}\" in the category \"{}\".",
        fields.title.trim(),
        fields.category.trim()
    );
    let options = GenerationOptions {
        max_tokens: 60,
        ..Default::default()
    };

    let alt = match provider.generate(&prompt, &options).await {
        Ok(generation) => generation.content.trim().trim_matches('"').to_string(),
        Err(e) => {
            warn!(image = %image, error = %e, "alt text generation failed, using fallback");
            fallback_alt_text(fields)
        }
    };

    cms.set_attachment_meta(image, &cache_key, &alt).await?;
    Ok(alt)
}

/// Assign an image to a page slot with generated alt text, clearing
/// incidental caption and description metadata.
pub async fn assign_image_with_metadata(
    cms: &dyn CmsAdapter,
    provider: &dyn TextProvider,
    config: &ImageConfig,
    image: &AttachmentId,
    page: &PageId,
    slot: &str,
    fields: &PageFields,
) -> Result<(), ForgeError> {
    let alt = if config.ai_alt_text {
        ai_alt_text(cms, provider, image, fields).await?
    } else {
        fallback_alt_text(fields)
    };

    cms.set_alt_text(image, &alt).await?;
    cms.clear_caption_and_description(image).await?;
    cms.attach_image(page, slot, image).await?;

    debug!(page = %page, slot, image = %image, "image assigned");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageforge_test_utils::{MockCms, MockTextProvider};

    fn fields() -> PageFields {
        PageFields {
            title: "Engagement Rings".into(),
            category: "Rings".into(),
            ..Default::default()
        }
    }

    fn setup() -> (MockCms, MockTextProvider, AttachmentId, PageId) {
        let cms = MockCms::new();
        cms.add_page("p1", "catalog_page", fields());
        cms.add_attachment("img-1", &["rings"], true);
        (
            cms,
            MockTextProvider::new(),
            AttachmentId("img-1".into()),
            PageId("p1".into()),
        )
    }

    #[tokio::test]
    async fn ai_alt_text_is_cached_per_image_and_context() {
        let (cms, provider, image, page) = setup();
        provider.push_text("Close-up of a gold engagement ring");
        let config = ImageConfig::default();

        assign_image_with_metadata(&cms, &provider, &config, &image, &page, "hero_image", &fields())
            .await
            .unwrap();
        assign_image_with_metadata(&cms, &provider, &config, &image, &page, "hero_image", &fields())
            .await
            .unwrap();

        // Second assignment hit the cache, only one provider call.
        assert_eq!(provider.call_count(), 1);
        assert_eq!(
            cms.alt_text("img-1").as_deref(),
            Some("Close-up of a gold engagement ring")
        );
        assert!(cms.caption_cleared("img-1"));
        assert_eq!(cms.attached_image("p1", "hero_image").as_deref(), Some("img-1"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_fallback() {
        let (cms, provider, image, page) = setup();
        provider.push_error(ForgeError::InvalidResponse("garbled".into()));
        let config = ImageConfig::default();

        assign_image_with_metadata(&cms, &provider, &config, &image, &page, "hero_image", &fields())
            .await
            .unwrap();

        assert_eq!(cms.alt_text("img-1").as_deref(), Some("Engagement Rings - Rings"));
    }

    #[tokio::test]
    async fn disabled_ai_alt_text_never_calls_provider() {
        let (cms, provider, image, page) = setup();
        let config = ImageConfig {
            ai_alt_text: false,
            ..Default::default()
        };

        assign_image_with_metadata(&cms, &provider, &config, &image, &page, "hero_image", &fields())
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 0);
        assert_eq!(cms.alt_text("img-1").as_deref(), Some("Engagement Rings - Rings"));
    }

    #[test]
    fn fallback_handles_sparse_fields() {
        let empty = PageFields::default();
        assert_eq!(fallback_alt_text(&empty), "Catalog image");

        let title_only = PageFields {
            title: "Rings".into(),
            ..Default::default()
        };
        assert_eq!(fallback_alt_text(&title_only), "Rings");
    }
}
