//! OpenRouter AI provider implementation.
//!
//! This module provides the [`OpenRouterProvider`] which implements the
//! [`ExplanationProvider`] trait for the OpenRouter chat-completions API
//! (<https://openrouter.ai/>).

use super::provider::{ExplanationProvider, ExplanationRequest, build_prompt};
use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default OpenRouter API endpoint.
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model to use for explanations.
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default temperature for model responses.
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default max tokens for responses.
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

impl OpenRouterResponse {
    fn into_text(self) -> Option<String> {
        self.choices?
            .into_iter()
            .next()?
            .message
            .map(|msg| msg.content)
    }
}

/// Configuration for the OpenRouter provider.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// The model to use (e.g., "deepseek/deepseek-chat", "openai/gpt-4o").
    pub model: String,
    /// Temperature for response generation (0.0 - 2.0).
    pub temperature: f32,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Base URL for the API (useful for proxies or custom endpoints).
    pub base_url: String,
}

impl Default for OpenRouterConfig {
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

impl OpenRouterConfig {
    pub fn builder() -> OpenRouterConfigBuilder {
        OpenRouterConfigBuilder::default()
    }
}

/// Builder for [`OpenRouterConfig`].
#[derive(Default)]
pub struct OpenRouterConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
}

impl OpenRouterConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature (0.0 - 2.0).
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

    /// Set a custom base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> OpenRouterConfig {
        OpenRouterConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// OpenRouter provider for dataset explanations.
///
/// # Example
///
/// ```rust,ignore
/// use eda_processing::ai::{OpenRouterProvider, OpenRouterConfig};
///
/// let config = OpenRouterConfig::builder()
///     .model("openai/gpt-4o-mini")
///     .temperature(0.2)
///     .build();
/// let provider = OpenRouterProvider::with_config("your-api-key", config)?;
/// ```
pub struct OpenRouterProvider {
    api_key: String,
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, OpenRouterConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: OpenRouterConfig) -> Result<Self> {
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

    fn build_request(&self, prompt: &str) -> OpenRouterRequest {
        OpenRouterRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    fn call_api(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);
        debug!("Requesting explanation from OpenRouter ({})", self.config.model);

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "EDA-Assistant")
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "OpenRouter API Error {}: {}",
                response.status(),
                response.text()?
            ));
        }

        let result: OpenRouterResponse = response.json()?;
        result
            .into_text()
            .ok_or_else(|| anyhow!("No response content from OpenRouter API"))
    }
}

impl ExplanationProvider for OpenRouterProvider {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<String> {
        let prompt = build_prompt(request);
        Ok(self.call_api(&prompt)?.trim().to_string())
    }

    fn name(&self) -> &str {
        "OpenRouter"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Response parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_valid_response_structure() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Column 'age' needs work."}}
            ]
        }"#;
        let response: OpenRouterResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.into_text().as_deref(),
            Some("Column 'age' needs work.")
        );
    }

    #[test]
    fn test_parse_response_with_empty_choices() {
        let response: OpenRouterResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.into_text().is_none());
    }

    #[test]
    fn test_parse_response_with_null_choices() {
        let response: OpenRouterResponse = serde_json::from_str(r#"{"choices": null}"#).unwrap();
        assert!(response.into_text().is_none());
    }

    #[test]
    fn test_parse_response_missing_message() {
        let response: OpenRouterResponse =
            serde_json::from_str(r#"{"choices": [{"finish_reason": "length"}]}"#).unwrap();
        assert!(response.into_text().is_none());
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(serde_json::from_str::<OpenRouterResponse>("{not json").is_err());
    }

    // -------------------------------------------------------------------------
    // Request building
    // -------------------------------------------------------------------------

    #[test]
    fn test_build_request_uses_config() {
        let config = OpenRouterConfig::builder()
            .model("openai/gpt-4o-mini")
            .max_tokens(256)
            .build();
        let provider = OpenRouterProvider::with_config("key", config).unwrap();
        let request = serde_json::to_value(provider.build_request("hello")).unwrap();

        assert_eq!(request["model"], "openai/gpt-4o-mini");
        assert_eq!(request["max_tokens"], 256);
        assert_eq!(request["messages"][0]["role"], "user");
        assert_eq!(request["messages"][0]["content"], "hello");
    }

    // -------------------------------------------------------------------------
    // Config builder
    // -------------------------------------------------------------------------

    #[test]
    fn test_config_builder_defaults() {
        let config = OpenRouterConfig::builder().build();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_builder_custom_values() {
        let config = OpenRouterConfig::builder()
            .temperature(0.9)
            .timeout_secs(5)
            .base_url("http://localhost:9999")
            .build();
        assert_eq!(config.temperature, 0.9);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url, "http://localhost:9999");
    }

    // -------------------------------------------------------------------------
    // Provider metadata
    // -------------------------------------------------------------------------

    #[test]
    fn test_provider_name_and_model() {
        let provider = OpenRouterProvider::new("key").unwrap();
        assert_eq!(provider.name(), "OpenRouter");
        assert_eq!(provider.model(), Some(DEFAULT_MODEL));
    }
}
