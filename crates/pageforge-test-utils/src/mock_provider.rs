// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted text and image providers.
//!
//! Responses are queued in advance and consumed in order, so tests control
//! exactly what each provider call returns. The call counter supports
//! cache-hit assertions ("the second lookup made no provider call").

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pageforge_core::{
    ForgeError, Generation, GenerationOptions, ImageProvider, TextProvider, TokenUsage,
};

type TextScript = Result<Generation, ForgeError>;

/// Text provider that replays a scripted queue of responses.
#[derive(Default)]
pub struct MockTextProvider {
    script: Mutex<VecDeque<TextScript>>,
    calls: AtomicUsize,
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response with fixed token usage.
    pub fn push_text(&self, content: &str) {
        self.push_generation(Generation {
            content: content.to_string(),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 50,
                total_tokens: 150,
            },
            model: "gpt-4o".to_string(),
        });
    }

    pub fn push_generation(&self, generation: Generation) {
        self.script.lock().unwrap().push_back(Ok(generation));
    }

    /// Queue a failure for the next call.
    pub fn push_error(&self, error: ForgeError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<Generation, ForgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ForgeError::Internal("mock text script exhausted".into())))
    }
}

type ImageScript = Result<Vec<u8>, ForgeError>;

/// Image provider that replays a scripted queue of byte payloads.
#[derive(Default)]
pub struct MockImageProvider {
    script: Mutex<VecDeque<ImageScript>>,
    calls: AtomicUsize,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        self.script.lock().unwrap().push_back(Ok(bytes.to_vec()));
    }

    pub fn push_error(&self, error: ForgeError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate_image(&self, _prompt: &str, _size: &str) -> Result<Vec<u8>, ForgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ForgeError::Internal("mock image script exhausted".into())))
    }
}
