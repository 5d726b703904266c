// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host CMS adapter trait.
//!
//! The host content-management system (post storage, taxonomies, media
//! library, settings store) is an external collaborator. The pipeline only
//! consumes it through this narrow interface; the admin UI and import paths
//! live entirely on the other side of it.

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::types::{AttachmentId, PageFields, PageId};

/// Narrow interface to the host CMS.
#[async_trait]
pub trait CmsAdapter: Send + Sync + 'static {
    /// Returns the record kind of the page, or `None` if the page no longer exists.
    async fn page_kind(&self, page: &PageId) -> Result<Option<String>, ForgeError>;

    /// Reads the structured fields of a page used for prompt context and
    /// image matching.
    async fn page_fields(&self, page: &PageId) -> Result<PageFields, ForgeError>;

    /// Persists the parsed content slots of one block to the page record.
    async fn set_block_content(
        &self,
        page: &PageId,
        block: &str,
        slots: &serde_json::Value,
    ) -> Result<(), ForgeError>;

    /// Reads a metadata value scoped to a page record.
    async fn get_meta(&self, page: &PageId, key: &str) -> Result<Option<String>, ForgeError>;

    /// Writes a metadata value scoped to a page record.
    async fn set_meta(&self, page: &PageId, key: &str, value: &str) -> Result<(), ForgeError>;

    /// Finds attachments tagged with every one of the given slugs (AND).
    ///
    /// With `library_only` set, restricts the result to attachments flagged
    /// as curated library images.
    async fn find_attachments_by_tags(
        &self,
        slugs: &[String],
        library_only: bool,
    ) -> Result<Vec<AttachmentId>, ForgeError>;

    /// Whether the attachment still exists in the media library.
    async fn attachment_exists(&self, id: &AttachmentId) -> Result<bool, ForgeError>;

    /// Reads a metadata value scoped to an attachment.
    async fn get_attachment_meta(
        &self,
        id: &AttachmentId,
        key: &str,
    ) -> Result<Option<String>, ForgeError>;

    /// Writes a metadata value scoped to an attachment.
    async fn set_attachment_meta(
        &self,
        id: &AttachmentId,
        key: &str,
        value: &str,
    ) -> Result<(), ForgeError>;

    /// Sets the alt text of an attachment.
    async fn set_alt_text(&self, id: &AttachmentId, alt: &str) -> Result<(), ForgeError>;

    /// Clears incidental attachment metadata (caption, description) to keep
    /// the media entry minimal.
    async fn clear_caption_and_description(&self, id: &AttachmentId) -> Result<(), ForgeError>;

    /// Assigns an attachment to a named image slot of a page.
    async fn attach_image(
        &self,
        page: &PageId,
        slot: &str,
        id: &AttachmentId,
    ) -> Result<(), ForgeError>;

    /// Uploads encoded image bytes to the media library.
    async fn store_attachment(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<AttachmentId, ForgeError>;

    /// Finalization hook: pushes generated metadata to the third-party SEO
    /// integration.
    async fn sync_seo_fields(&self, page: &PageId) -> Result<(), ForgeError>;

    /// Finalization hook: recomputes related-content links for the page.
    async fn refresh_related_links(&self, page: &PageId) -> Result<(), ForgeError>;
}
