// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider traits for external AI generation services.

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::types::{Generation, GenerationOptions};

/// Adapter for a stateless text-generation provider.
///
/// Implementations own their retry policy for transient failures; callers
/// only ever see the final outcome. Rate limits (429) are surfaced as
/// [`ForgeError::RateLimited`] without retry so the orchestrator can decide.
#[async_trait]
pub trait TextProvider: Send + Sync + 'static {
    /// Generates text for the given prompt.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, ForgeError>;
}

/// Adapter for an AI image-generation provider.
#[async_trait]
pub trait ImageProvider: Send + Sync + 'static {
    /// Generates an image for the given prompt and returns the encoded bytes.
    ///
    /// `size` is a provider-format dimension string, e.g. "1024x1024".
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<Vec<u8>, ForgeError>;
}
