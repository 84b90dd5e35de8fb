//! Explanation provider trait for abstracting LLM interactions.
//!
//! This module defines the [`ExplanationProvider`] trait that lets the
//! server turn a profile and risk assessment into prose without knowing
//! which backend (OpenRouter, Anthropic, rules) produced it.
//!
//! # Implementing a New Provider
//!
//! 1. Create a new file in `src/ai/` (e.g., `ollama.rs`)
//! 2. Implement [`ExplanationProvider`] for your provider struct
//! 3. Export the provider in `src/ai/mod.rs`

use crate::types::{DatasetProfile, Explanation, RiskAssessment};
use anyhow::Result;
use tracing::warn;

use super::RuleBasedExplainer;

/// Everything a provider gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationRequest<'a> {
    pub profile: &'a DatasetProfile,
    pub risk: &'a RiskAssessment,
}

impl<'a> ExplanationRequest<'a> {
    pub fn new(profile: &'a DatasetProfile, risk: &'a RiskAssessment) -> Self {
        Self { profile, risk }
    }
}

/// Trait for providers that can explain data quality findings.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single provider can be shared
/// by every request handler.
///
/// # Error Handling
///
/// Implementations should return meaningful errors via `anyhow::Result`.
/// Callers fall back to [`RuleBasedExplainer`] when a provider fails.
pub trait ExplanationProvider: Send + Sync {
    /// Produce a natural-language explanation of the request.
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<String>;

    /// Get the provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Get the model being used by this provider.
    ///
    /// Returns `None` if the provider doesn't expose model information.
    fn model(&self) -> Option<&str> {
        None
    }
}

/// Ask `provider` for an explanation, falling back to the rule-based text
/// when there is no provider or the call fails.
pub fn explain_or_fallback(
    provider: Option<&dyn ExplanationProvider>,
    request: &ExplanationRequest<'_>,
) -> Explanation {
    if let Some(provider) = provider {
        match provider.explain(request) {
            Ok(text) if !text.trim().is_empty() => {
                return Explanation {
                    explanation: text,
                    provider: provider.name().to_string(),
                    model: provider.model().map(str::to_string),
                };
            }
            Ok(_) => warn!("{} returned an empty explanation, using rules", provider.name()),
            Err(e) => warn!("{} explanation failed: {:#}", provider.name(), e),
        }
    }

    let rules = RuleBasedExplainer;
    Explanation {
        explanation: rules.render(request),
        provider: rules.name().to_string(),
        model: None,
    }
}

/// Render the prompt sent to remote language models.
pub fn build_prompt(request: &ExplanationRequest<'_>) -> String {
    let profile = request.profile;
    let risk = request.risk;
    let critical: Vec<_> = risk.critical_issues().collect();
    let critical_json =
        serde_json::to_string_pretty(&critical).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a data quality expert. Analyze this dataset profile and risk assessment:\n\n\
        Dataset Overview:\n\
        - Rows: {}\n\
        - Columns: {}\n\
        - Duplicates: {} ({:.1}%)\n\
        - Memory Usage: {:.2} MB\n\n\
        Risk Assessment:\n\
        - Risk Level: {}\n\
        - Risk Score: {:.2}/1.0\n\
        - Missing Value Rate: {:.1}%\n\
        - Duplicate Rate: {:.1}%\n\n\
        Critical Issues:\n{}\n\n\
        Provide a concise analysis of these data quality issues and recommend specific \
        data cleaning strategies. Focus on what columns need attention and why.",
        profile.row_count,
        profile.column_count,
        profile.duplicate_row_count,
        profile.duplicate_percentage,
        profile.memory_estimate_mb,
        risk.risk_level.as_str(),
        risk.risk_score,
        risk.components.missing_value_rate * 100.0,
        risk.components.duplicate_rate * 100.0,
        critical_json,
    )
}
