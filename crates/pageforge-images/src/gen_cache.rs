// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation with a persistent context-hash cache.
//!
//! Used for AI-drawn illustrative images on related-item cards. A cache hit
//! returns the stored attachment without any provider call and bumps the
//! usage counter. A miss costs two provider calls (prompt optimization,
//! then image generation) plus a fixed per-image charge against the budget.

use std::sync::Arc;

use chrono::Utc;
use pageforge_config::ImageConfig;
use pageforge_core::{
    AttachmentId, CmsAdapter, ForgeError, GenerationOptions, ImageProvider, PageId, TextProvider,
    TokenUsage,
};
use pageforge_cost::{CostTracker, GenerationEntry};
use pageforge_storage::{queries::image_cache, Database, ImageCacheRecord};
use tracing::{debug, info};

use crate::hash::context_hash;
use crate::tags::slugify;

/// Block type recorded in the generation log for cached image generation.
const IMAGE_LOG_BLOCK: &str = "image_generation";

/// Cached image generator for related-item cards.
pub struct ImageGenerator {
    db: Arc<Database>,
}

impl ImageGenerator {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Return a cached attachment for (title, category), generating and
    /// caching a new one on miss.
    #[allow(clippy::too_many_arguments)]
    pub async fn find_or_generate(
        &self,
        cms: &dyn CmsAdapter,
        text: &dyn TextProvider,
        images: &dyn ImageProvider,
        tracker: &CostTracker,
        config: &ImageConfig,
        page: &PageId,
        title: &str,
        category: &str,
    ) -> Result<AttachmentId, ForgeError> {
        let hash = context_hash(title, category);

        if let Some(record) = image_cache::find_by_hash(&self.db, &hash).await? {
            image_cache::touch(&self.db, &hash).await?;
            debug!(hash = %hash, attachment = %record.attachment_id, "image cache hit");
            return Ok(AttachmentId(record.attachment_id));
        }

        if !config.ai_generation {
            return Err(ForgeError::Cms {
                message: format!("no cached image for '{title}' and AI generation is disabled"),
            });
        }

        // First call: turn the bare context into a usable visual prompt.
        let optimize = format!(
            "Write a single concise prompt (max 50 words) for an image generation model, \
             describing a clean product photograph illustrating \"{}\" in the category \
             \"{}\". Respond with the prompt only.",
            title.trim(),
            category.trim()
        );
        let options = GenerationOptions {
            max_tokens: 120,
            ..Default::default()
        };
        let prompt = text.generate(&optimize, &options).await?.content.trim().to_string();

        // Second call: the image itself.
        let bytes = images.generate_image(&prompt, &config.image_size).await?;

        let filename = format!("{}.png", slugify(title));
        let attachment = cms.store_attachment(bytes, &filename).await?;

        let now = Utc::now();
        image_cache::upsert(
            &self.db,
            &ImageCacheRecord {
                context_hash: hash.clone(),
                title: title.to_string(),
                category: category.to_string(),
                generation_prompt: prompt,
                attachment_id: attachment.0.clone(),
                usage_count: 1,
                created_at: now,
                last_used: now,
            },
        )
        .await?;

        // Fixed per-image charge, independent of token accounting.
        tracker
            .record(&GenerationEntry::success(
                page,
                IMAGE_LOG_BLOCK,
                &TokenUsage::default(),
                config.generation_cost_usd,
                "dall-e-3",
                None,
            ))
            .await?;

        info!(hash = %hash, attachment = %attachment, "image generated and cached");
        Ok(attachment)
    }
}
