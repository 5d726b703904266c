// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tag-based image matching cascade.
//!
//! Five tiers, first hit wins: folder phrase, all extracted tags (AND), the
//! first two tags, the first tag, then the configured default image. Within
//! each tier curated library images are preferred; ties are broken uniformly
//! at random.

use pageforge_core::{AttachmentId, CmsAdapter, ForgeError, PageFields};
use rand::seq::SliceRandom;
use tracing::debug;

use crate::tags::{extract_tags, folder_phrases, slugify};

fn pick(candidates: &[AttachmentId]) -> Option<AttachmentId> {
    candidates.choose(&mut rand::thread_rng()).cloned()
}

/// Query one tag combination, preferring library-flagged attachments and
/// falling back to any tagged attachment.
async fn query_tier(
    cms: &dyn CmsAdapter,
    tier: u8,
    slugs: &[String],
) -> Result<Option<AttachmentId>, ForgeError> {
    for library_only in [true, false] {
        let candidates = cms.find_attachments_by_tags(slugs, library_only).await?;
        if !candidates.is_empty() {
            let selected = pick(&candidates);
            debug!(
                tier,
                tags = %slugs.join(","),
                library_only,
                count = candidates.len(),
                selected = selected.as_ref().map(|id| id.0.as_str()).unwrap_or(""),
                "image tier matched"
            );
            return Ok(selected);
        }
    }
    debug!(tier, tags = %slugs.join(","), count = 0usize, "image tier empty");
    Ok(None)
}

/// Run the matching cascade for a page's fields.
///
/// Returns `None` only when every tier, including the configured default,
/// comes up empty.
pub async fn find_matching_image(
    cms: &dyn CmsAdapter,
    fields: &PageFields,
    default_image_id: Option<&str>,
) -> Result<Option<AttachmentId>, ForgeError> {
    // Tier 1: raw folder phrases, slugified whole.
    for phrase in folder_phrases(fields) {
        let slug = slugify(&phrase);
        if slug.is_empty() {
            continue;
        }
        if let Some(hit) = query_tier(cms, 1, &[slug]).await? {
            return Ok(Some(hit));
        }
    }

    let tags = extract_tags(fields);

    // Tier 2: every extracted tag must match.
    if !tags.is_empty() {
        if let Some(hit) = query_tier(cms, 2, &tags).await? {
            return Ok(Some(hit));
        }
    }

    // Tier 3: first two tags.
    if tags.len() >= 2 {
        if let Some(hit) = query_tier(cms, 3, &tags[..2]).await? {
            return Ok(Some(hit));
        }
    }

    // Tier 4: first tag only.
    if !tags.is_empty() {
        if let Some(hit) = query_tier(cms, 4, &tags[..1]).await? {
            return Ok(Some(hit));
        }
    }

    // Tier 5: configured default, verified to still exist.
    if let Some(default_id) = default_image_id {
        let id = AttachmentId(default_id.to_string());
        if cms.attachment_exists(&id).await? {
            debug!(tier = 5u8, selected = %id, "default image used");
            return Ok(Some(id));
        }
        debug!(tier = 5u8, default = %id, "default image missing");
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageforge_test_utils::MockCms;

    fn fields() -> PageFields {
        PageFields {
            title: "Engagement Rings".into(),
            category: "Rings".into(),
            focus_keyword: Some("engagement rings".into()),
            topic: None,
            potential_folders: vec!["bridal collection".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn folder_tier_beats_tag_tiers() {
        let cms = MockCms::new();
        cms.add_attachment("folder-img", &["bridal-collection"], true);
        cms.add_attachment("tag-img", &["engagement", "rings"], true);

        let hit = find_matching_image(&cms, &fields(), None).await.unwrap();
        assert_eq!(hit.unwrap().0, "folder-img");
    }

    #[tokio::test]
    async fn folder_tier_falls_back_to_non_library() {
        let cms = MockCms::new();
        cms.add_attachment("folder-img", &["bridal-collection"], false);

        let hit = find_matching_image(&cms, &fields(), None).await.unwrap();
        assert_eq!(hit.unwrap().0, "folder-img");
    }

    fn keyword_only_fields() -> PageFields {
        PageFields {
            title: "Gold Rings".into(),
            category: String::new(),
            focus_keyword: Some("gold rings".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn all_tags_tier_requires_every_tag() {
        let cms = MockCms::new();
        cms.add_attachment("both", &["gold", "rings"], true);
        cms.add_attachment("one", &["gold"], true);

        let hit = find_matching_image(&cms, &keyword_only_fields(), None)
            .await
            .unwrap();
        assert_eq!(hit.unwrap().0, "both");
    }

    #[tokio::test]
    async fn cascade_degrades_to_single_tag() {
        let cms = MockCms::new();
        // Matches only the first extracted tag ("gold").
        cms.add_attachment("single", &["gold"], false);

        let hit = find_matching_image(&cms, &keyword_only_fields(), None)
            .await
            .unwrap();
        assert_eq!(hit.unwrap().0, "single");
    }

    #[tokio::test]
    async fn default_image_must_exist() {
        let cms = MockCms::new();
        let hit = find_matching_image(&cms, &fields(), Some("gone")).await.unwrap();
        assert!(hit.is_none());

        cms.add_attachment("fallback", &[], false);
        let hit = find_matching_image(&cms, &fields(), Some("fallback"))
            .await
            .unwrap();
        assert_eq!(hit.unwrap().0, "fallback");
    }

    #[tokio::test]
    async fn no_match_without_default() {
        let cms = MockCms::new();
        let hit = find_matching_image(&cms, &fields(), None).await.unwrap();
        assert!(hit.is_none());
    }
}
