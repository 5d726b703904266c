// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI chat completions and image generation APIs.
//!
//! Provides [`OpenAiClient`] which handles request construction,
//! authentication, and the transient error retry policy:
//!
//! - timeout: one retry after 5s, then a fatal `Timeout`
//! - network/connection error: up to two retries with 2s/4s backoff
//! - upstream 5xx: one retry after 2s
//! - 401: fatal `InvalidCredentials`, no retry
//! - 429: fatal `RateLimited` carrying the `Retry-After` hint; the caller
//!   decides whether to wait, not this client
//! - unparseable body: fatal `InvalidResponse`

use std::time::Duration;

use pageforge_core::{ForgeError, Generation, GenerationOptions, TokenUsage};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, ChatMessage, ChatRequest, ChatResponse, ImageRequest, ImageResponse,
};

/// Base URL for the OpenAI API.
const API_BASE_URL: &str = "https://api.openai.com";

const TIMEOUT_RETRY_PAUSE: Duration = Duration::from_secs(5);
const SERVER_RETRY_PAUSE: Duration = Duration::from_secs(2);
const NETWORK_RETRY_BASE: Duration = Duration::from_secs(2);

const MAX_TIMEOUT_RETRIES: u32 = 1;
const MAX_NETWORK_RETRIES: u32 = 2;
const MAX_SERVER_RETRIES: u32 = 1;

/// HTTP client for OpenAI API communication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    default_model: String,
    timeout: Duration,
    base_url: String,
    // Retry pauses are fields so tests can shrink them.
    timeout_retry_pause: Duration,
    server_retry_pause: Duration,
    network_retry_base: Duration,
}

impl OpenAiClient {
    /// Creates a new OpenAI API client.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ForgeError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {api_key}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&auth)
                .map_err(|e| ForgeError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ForgeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            default_model: model,
            timeout,
            base_url: API_BASE_URL.to_string(),
            timeout_retry_pause: TIMEOUT_RETRY_PAUSE,
            server_retry_pause: SERVER_RETRY_PAUSE,
            network_retry_base: NETWORK_RETRY_BASE,
        })
    }

    /// Returns the default model identifier.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Shrinks retry pauses (for testing).
    #[cfg(test)]
    pub fn with_fast_retries(mut self) -> Self {
        self.timeout_retry_pause = Duration::from_millis(10);
        self.server_retry_pause = Duration::from_millis(10);
        self.network_retry_base = Duration::from_millis(10);
        self
    }

    /// Sends a chat completion request and returns the generated text with
    /// token usage.
    pub async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, ForgeError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.send_with_retries(&url, serde_json::to_value(&request).unwrap_or_default()).await?;

        let response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ForgeError::InvalidResponse(format!("chat completion body: {e}")))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ForgeError::InvalidResponse("chat completion had no choices".into()))?;

        Ok(Generation {
            content: choice.message.content,
            usage: TokenUsage {
                prompt_tokens: response.usage.prompt_tokens,
                completion_tokens: response.usage.completion_tokens,
                total_tokens: response.usage.total_tokens,
            },
            model: response.model,
        })
    }

    /// Sends an image generation request and returns the decoded image bytes.
    pub async fn generate_image(&self, prompt: &str, size: &str) -> Result<Vec<u8>, ForgeError> {
        let request = ImageRequest {
            model: "dall-e-3".to_string(),
            prompt: prompt.to_string(),
            n: 1,
            size: size.to_string(),
            response_format: "b64_json".to_string(),
        };

        let url = format!("{}/v1/images/generations", self.base_url);
        let body = self.send_with_retries(&url, serde_json::to_value(&request).unwrap_or_default()).await?;

        let response: ImageResponse = serde_json::from_str(&body)
            .map_err(|e| ForgeError::InvalidResponse(format!("image generation body: {e}")))?;

        let datum = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ForgeError::InvalidResponse("image generation had no data".into()))?;

        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD
            .decode(datum.b64_json.as_bytes())
            .map_err(|e| ForgeError::InvalidResponse(format!("image payload not base64: {e}")))
    }

    /// POSTs a JSON body with the full retry policy applied, returning the
    /// raw response body on success.
    async fn send_with_retries(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<String, ForgeError> {
        let mut timeout_retries = 0u32;
        let mut network_retries = 0u32;
        let mut server_retries = 0u32;

        loop {
            let result = self.client.post(url).json(&body).send().await;

            let response = match result {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    if timeout_retries < MAX_TIMEOUT_RETRIES {
                        timeout_retries += 1;
                        warn!(attempt = timeout_retries, "request timed out, retrying");
                        tokio::time::sleep(self.timeout_retry_pause).await;
                        continue;
                    }
                    return Err(ForgeError::Timeout {
                        duration: self.timeout,
                    });
                }
                Err(e) => {
                    if network_retries < MAX_NETWORK_RETRIES {
                        network_retries += 1;
                        // Exponential backoff: 2s, 4s.
                        let pause = self.network_retry_base * 2u32.pow(network_retries - 1);
                        warn!(
                            attempt = network_retries,
                            error = %e,
                            "network error, retrying"
                        );
                        tokio::time::sleep(pause).await;
                        continue;
                    }
                    return Err(ForgeError::Provider {
                        message: format!("request failed after network retries: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
            };

            let status = response.status();
            debug!(status = %status, "provider response received");

            if status.is_success() {
                return response.text().await.map_err(|e| ForgeError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            if status.as_u16() == 401 {
                return Err(ForgeError::InvalidCredentials);
            }

            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                return Err(ForgeError::RateLimited { retry_after });
            }

            if status.is_server_error() && server_retries < MAX_SERVER_RETRIES {
                server_retries += 1;
                let body_text = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body_text, "server error, retrying");
                tokio::time::sleep(self.server_retry_pause).await;
                continue;
            }

            // Non-retryable error status or exhausted server retries.
            let body_text = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body_text)
            {
                format!(
                    "OpenAI API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                )
            } else {
                format!("API returned {status}: {body_text}")
            };
            return Err(ForgeError::Provider {
                message,
                source: None,
            });
        }
    }
}
