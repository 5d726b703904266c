// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI provider adapter.
//!
//! Implements [`TextProvider`] and [`ImageProvider`] on top of the raw
//! [`OpenAiClient`]. The API key is resolved from configuration first, then
//! the `OPENAI_API_KEY` environment variable.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use pageforge_config::OpenAiConfig;
use pageforge_core::{ForgeError, Generation, GenerationOptions, ImageProvider, TextProvider};

pub use client::OpenAiClient;

/// Environment variable consulted when no API key is configured.
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Resolves the API key from config or environment.
fn resolve_api_key(config: &OpenAiConfig) -> Result<String, ForgeError> {
    if let Some(key) = &config.api_key {
        if !key.trim().is_empty() {
            return Ok(key.clone());
        }
    }
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ForgeError::Config(format!(
            "no OpenAI API key: set openai.api_key in the config file or the {API_KEY_ENV} environment variable"
        ))),
    }
}

/// OpenAI-backed text and image provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: OpenAiClient,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Creates a provider from configuration, resolving the API key.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, ForgeError> {
        let api_key = resolve_api_key(config)?;
        let client = OpenAiClient::new(
            api_key,
            config.default_model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    #[cfg(test)]
    fn from_client(client: OpenAiClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }
}

#[async_trait]
impl TextProvider for OpenAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, ForgeError> {
        // A zero max_tokens in the options means "use the configured default".
        let mut options = options.clone();
        if options.max_tokens == 0 {
            options.max_tokens = self.max_tokens;
        }
        self.client.complete(prompt, &options).await
    }
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<Vec<u8>, ForgeError> {
        self.client.generate_image(prompt, size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn api_key_from_config_wins() {
        let config = OpenAiConfig {
            api_key: Some("sk-config".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&config).unwrap(), "sk-config");
    }

    #[test]
    fn blank_config_key_is_rejected() {
        let config = OpenAiConfig {
            api_key: Some("   ".into()),
            ..Default::default()
        };
        // With no env fallback set in tests this must error.
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(matches!(
                resolve_api_key(&config),
                Err(ForgeError::Config(_))
            ));
        }
    }

    #[tokio::test]
    async fn provider_fills_default_max_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({"max_tokens": 512}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o",
                "choices": [{
                    "message": {"role": "assistant", "content": "ok"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("k".into(), "gpt-4o".into(), Duration::from_secs(2))
            .unwrap()
            .with_base_url(server.uri());
        let provider = OpenAiProvider::from_client(client, 512);

        let options = GenerationOptions {
            max_tokens: 0,
            ..Default::default()
        };
        let result = provider.generate("hi", &options).await.unwrap();
        assert_eq!(result.content, "ok");
    }
}
