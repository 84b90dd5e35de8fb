//! Natural-language explanations of profiling and risk results.
//!
//! # Feature Flag
//!
//! The remote providers need the `ai` feature (enabled by default). The
//! [`ExplanationProvider`] trait and the [`RuleBasedExplainer`] are always
//! available.
//!
//! ```toml
//! # Disable remote providers for a smaller binary
//! eda-processing = { path = "crates/eda-processing", default-features = false }
//! ```
//!
//! # Providers
//!
//! - [`OpenRouterProvider`] - OpenRouter chat completions (requires `ai` feature)
//! - [`AnthropicProvider`] - Anthropic Messages API (requires `ai` feature)
//! - [`RuleBasedExplainer`] - deterministic text, used as the fallback

mod provider;
mod rule_based;

pub use provider::{ExplanationProvider, ExplanationRequest, build_prompt, explain_or_fallback};
pub use rule_based::RuleBasedExplainer;

#[cfg(feature = "ai")]
mod anthropic;
#[cfg(feature = "ai")]
mod openrouter;

#[cfg(feature = "ai")]
pub use anthropic::{AnthropicConfig, AnthropicConfigBuilder, AnthropicProvider};

#[cfg(feature = "ai")]
pub use openrouter::{OpenRouterConfig, OpenRouterConfigBuilder, OpenRouterProvider};
