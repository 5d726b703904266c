// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory CMS adapter for tests.
//!
//! Holds pages, attachments, and metadata in plain maps behind one mutex,
//! and records finalization calls so tests can assert on side effects.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use pageforge_core::{AttachmentId, CmsAdapter, ForgeError, PageFields, PageId};

#[derive(Debug, Clone, Default)]
struct MockPage {
    kind: String,
    fields: PageFields,
    blocks: HashMap<String, serde_json::Value>,
    meta: HashMap<String, String>,
    images: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
struct MockAttachment {
    tags: Vec<String>,
    library: bool,
    alt_text: Option<String>,
    meta: HashMap<String, String>,
    caption_cleared: bool,
}

#[derive(Default)]
struct CmsState {
    pages: HashMap<String, MockPage>,
    attachments: HashMap<String, MockAttachment>,
    seo_synced: Vec<String>,
    related_refreshed: Vec<String>,
    next_upload: u32,
}

/// In-memory stand-in for the host CMS.
#[derive(Default)]
pub struct MockCms {
    state: Mutex<CmsState>,
}

impl MockCms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&self, id: &str, kind: &str, fields: PageFields) {
        self.state.lock().unwrap().pages.insert(
            id.to_string(),
            MockPage {
                kind: kind.to_string(),
                fields,
                ..Default::default()
            },
        );
    }

    pub fn add_attachment(&self, id: &str, tags: &[&str], library: bool) {
        self.state.lock().unwrap().attachments.insert(
            id.to_string(),
            MockAttachment {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                library,
                ..Default::default()
            },
        );
    }

    pub fn remove_page(&self, id: &str) {
        self.state.lock().unwrap().pages.remove(id);
    }

    pub fn block_content(&self, page: &str, block: &str) -> Option<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .pages
            .get(page)
            .and_then(|p| p.blocks.get(block).cloned())
    }

    pub fn attached_image(&self, page: &str, slot: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .pages
            .get(page)
            .and_then(|p| p.images.get(slot).cloned())
    }

    pub fn alt_text(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .attachments
            .get(id)
            .and_then(|a| a.alt_text.clone())
    }

    pub fn caption_cleared(&self, id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .attachments
            .get(id)
            .map(|a| a.caption_cleared)
            .unwrap_or(false)
    }

    pub fn seo_synced(&self, page: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .seo_synced
            .iter()
            .any(|p| p == page)
    }

    pub fn related_refreshed(&self, page: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .related_refreshed
            .iter()
            .any(|p| p == page)
    }

    fn page_missing(page: &PageId) -> ForgeError {
        ForgeError::InvalidPage {
            page_id: page.0.clone(),
            message: "page does not exist".to_string(),
        }
    }

    fn attachment_missing(id: &AttachmentId) -> ForgeError {
        ForgeError::Cms {
            message: format!("attachment {id} does not exist"),
        }
    }
}

#[async_trait]
impl CmsAdapter for MockCms {
    async fn page_kind(&self, page: &PageId) -> Result<Option<String>, ForgeError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pages
            .get(&page.0)
            .map(|p| p.kind.clone()))
    }

    async fn page_fields(&self, page: &PageId) -> Result<PageFields, ForgeError> {
        self.state
            .lock()
            .unwrap()
            .pages
            .get(&page.0)
            .map(|p| p.fields.clone())
            .ok_or_else(|| Self::page_missing(page))
    }

    async fn set_block_content(
        &self,
        page: &PageId,
        block: &str,
        slots: &serde_json::Value,
    ) -> Result<(), ForgeError> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .pages
            .get_mut(&page.0)
            .ok_or_else(|| Self::page_missing(page))?;
        record.blocks.insert(block.to_string(), slots.clone());
        Ok(())
    }

    async fn get_meta(&self, page: &PageId, key: &str) -> Result<Option<String>, ForgeError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pages
            .get(&page.0)
            .and_then(|p| p.meta.get(key).cloned()))
    }

    async fn set_meta(&self, page: &PageId, key: &str, value: &str) -> Result<(), ForgeError> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .pages
            .get_mut(&page.0)
            .ok_or_else(|| Self::page_missing(page))?;
        record.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn find_attachments_by_tags(
        &self,
        slugs: &[String],
        library_only: bool,
    ) -> Result<Vec<AttachmentId>, ForgeError> {
        let state = self.state.lock().unwrap();
        let mut matches: Vec<String> = state
            .attachments
            .iter()
            .filter(|(_, a)| !library_only || a.library)
            .filter(|(_, a)| slugs.iter().all(|slug| a.tags.iter().any(|t| t == slug)))
            .map(|(id, _)| id.clone())
            .collect();
        // Deterministic order for tests.
        matches.sort();
        Ok(matches.into_iter().map(AttachmentId).collect())
    }

    async fn attachment_exists(&self, id: &AttachmentId) -> Result<bool, ForgeError> {
        Ok(self.state.lock().unwrap().attachments.contains_key(&id.0))
    }

    async fn get_attachment_meta(
        &self,
        id: &AttachmentId,
        key: &str,
    ) -> Result<Option<String>, ForgeError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .attachments
            .get(&id.0)
            .and_then(|a| a.meta.get(key).cloned()))
    }

    async fn set_attachment_meta(
        &self,
        id: &AttachmentId,
        key: &str,
        value: &str,
    ) -> Result<(), ForgeError> {
        let mut state = self.state.lock().unwrap();
        let attachment = state
            .attachments
            .get_mut(&id.0)
            .ok_or_else(|| Self::attachment_missing(id))?;
        attachment.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_alt_text(&self, id: &AttachmentId, alt: &str) -> Result<(), ForgeError> {
        let mut state = self.state.lock().unwrap();
        let attachment = state
            .attachments
            .get_mut(&id.0)
            .ok_or_else(|| Self::attachment_missing(id))?;
        attachment.alt_text = Some(alt.to_string());
        Ok(())
    }

    async fn clear_caption_and_description(&self, id: &AttachmentId) -> Result<(), ForgeError> {
        let mut state = self.state.lock().unwrap();
        let attachment = state
            .attachments
            .get_mut(&id.0)
            .ok_or_else(|| Self::attachment_missing(id))?;
        attachment.caption_cleared = true;
        Ok(())
    }

    async fn attach_image(
        &self,
        page: &PageId,
        slot: &str,
        id: &AttachmentId,
    ) -> Result<(), ForgeError> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .pages
            .get_mut(&page.0)
            .ok_or_else(|| Self::page_missing(page))?;
        record.images.insert(slot.to_string(), id.0.clone());
        Ok(())
    }

    async fn store_attachment(
        &self,
        _bytes: Vec<u8>,
        filename: &str,
    ) -> Result<AttachmentId, ForgeError> {
        let mut state = self.state.lock().unwrap();
        state.next_upload += 1;
        let id = format!("upload-{}-{filename}", state.next_upload);
        state.attachments.insert(id.clone(), MockAttachment::default());
        Ok(AttachmentId(id))
    }

    async fn sync_seo_fields(&self, page: &PageId) -> Result<(), ForgeError> {
        self.state.lock().unwrap().seo_synced.push(page.0.clone());
        Ok(())
    }

    async fn refresh_related_links(&self, page: &PageId) -> Result<(), ForgeError> {
        self.state
            .lock()
            .unwrap()
            .related_refreshed
            .push(page.0.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tag_search_is_and_semantics() {
        let cms = MockCms::new();
        cms.add_attachment("a1", &["rings", "gold"], true);
        cms.add_attachment("a2", &["rings"], false);

        let both = cms
            .find_attachments_by_tags(&["rings".into(), "gold".into()], false)
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].0, "a1");

        let library_rings = cms
            .find_attachments_by_tags(&["rings".into()], true)
            .await
            .unwrap();
        assert_eq!(library_rings.len(), 1);

        let any_rings = cms
            .find_attachments_by_tags(&["rings".into()], false)
            .await
            .unwrap();
        assert_eq!(any_rings.len(), 2);
    }

    #[tokio::test]
    async fn missing_page_reads_as_none_kind() {
        let cms = MockCms::new();
        let kind = cms.page_kind(&PageId("nope".into())).await.unwrap();
        assert!(kind.is_none());
    }
}
