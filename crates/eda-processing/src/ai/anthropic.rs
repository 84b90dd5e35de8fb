//! Anthropic Messages API provider implementation.
//!
//! This module provides the [`AnthropicProvider`] which implements the
//! [`ExplanationProvider`] trait for <https://docs.anthropic.com/en/api/messages>.

use std::time::Duration;

use super::provider::{ExplanationProvider, ExplanationRequest, build_prompt};
use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default Messages API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default model to use for explanations.
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_TOKENS: u32 = 1024;

// Messages API request structures
#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

// Messages API response structures
#[derive(Deserialize)]
struct MessagesResponse {
    content: Option<Vec<ContentBlock>>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl MessagesResponse {
    /// Concatenate the text blocks of the reply.
    fn into_text(self) -> Option<String> {
        if self.stop_reason.as_deref() == Some("max_tokens") {
            warn!("Anthropic response was truncated at max_tokens");
        }
        let text: String = self
            .content?
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub model: String,
    /// Temperature for response generation (0.0 - 1.0).
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Base URL for the API (useful for proxies or custom endpoints).
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AnthropicConfig {
    pub fn builder() -> AnthropicConfigBuilder {
        AnthropicConfigBuilder::default()
    }
}

/// Builder for [`AnthropicConfig`].
#[derive(Default)]
pub struct AnthropicConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
}

impl AnthropicConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> AnthropicConfig {
        AnthropicConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Anthropic provider for dataset explanations.
pub struct AnthropicProvider {
    api_key: String,
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, AnthropicConfig::default())
    }

    /// Create a provider with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(api_key: impl Into<String>, config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_key: api_key.into(),
            config,
            client,
        })
    }

    fn build_request(&self, prompt: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }

    fn call_api(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);
        debug!("Requesting explanation from Anthropic ({})", self.config.model);

        let response = self
            .client
            .post(&self.config.base_url)
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Anthropic API Error {}: {}",
                response.status(),
                response.text()?
            ));
        }

        let result: MessagesResponse = response.json()?;
        result
            .into_text()
            .ok_or_else(|| anyhow!("No text content in Anthropic response"))
    }
}

impl ExplanationProvider for AnthropicProvider {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<String> {
        let prompt = build_prompt(request);
        Ok(self.call_api(&prompt)?.trim().to_string())
    }

    fn name(&self) -> &str {
        "Anthropic"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}
