// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pageforge content generation pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Pageforge workspace. The provider client,
//! host CMS bridge, and notifier implementations all implement traits defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ForgeError;
pub use types::{
    AttachmentId, Generation, GenerationOptions, JobStatus, PageFields, PageId, TokenUsage,
};

pub use traits::{CmsAdapter, ImageProvider, Notifier, TextProvider, TracingNotifier};
