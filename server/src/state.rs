//! Shared application state handed to every handler.

use crate::config::{ExplainProviderKind, ServerConfig};
use crate::session::SessionStore;
use eda_processing::ExplanationProvider;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub config: Arc<ServerConfig>,
    /// Remote explanation provider. `None` means rule-based explanations.
    pub explainer: Option<Arc<dyn ExplanationProvider>>,
}

impl AppState {
    pub fn new(config: ServerConfig, explainer: Option<Arc<dyn ExplanationProvider>>) -> Self {
        let sessions = SessionStore::new(config.session_ttl, config.max_sessions);
        Self {
            sessions: Arc::new(sessions),
            config: Arc::new(config),
            explainer,
        }
    }
}

/// Build the configured remote provider.
///
/// Creates a blocking HTTP client, so call it outside of async contexts
/// (e.g. through `spawn_blocking`). A provider that fails to build is logged
/// and replaced by rule-based explanations.
#[cfg(feature = "ai")]
pub fn build_explainer(config: &ServerConfig) -> Option<Arc<dyn ExplanationProvider>> {
    use eda_processing::ai::{
        AnthropicConfig, AnthropicProvider, OpenRouterConfig, OpenRouterProvider,
    };

    let provider: anyhow::Result<Arc<dyn ExplanationProvider>> = match config.explain_provider {
        ExplainProviderKind::None => return None,
        ExplainProviderKind::OpenRouter => {
            let key = config.openrouter_api_key.clone()?;
            let mut builder = OpenRouterConfig::builder();
            if let Some(ref model) = config.explain_model {
                builder = builder.model(model);
            }
            OpenRouterProvider::with_config(key, builder.build())
                .map(|p| Arc::new(p) as Arc<dyn ExplanationProvider>)
        }
        ExplainProviderKind::Anthropic => {
            let key = config.anthropic_api_key.clone()?;
            let mut builder = AnthropicConfig::builder();
            if let Some(ref model) = config.explain_model {
                builder = builder.model(model);
            }
            AnthropicProvider::with_config(key, builder.build())
                .map(|p| Arc::new(p) as Arc<dyn ExplanationProvider>)
        }
    };

    match provider {
        Ok(provider) => {
            info!(
                "Explanations provided by {} ({})",
                provider.name(),
                provider.model().unwrap_or("default model")
            );
            Some(provider)
        }
        Err(e) => {
            warn!("Could not create explanation provider: {:#}", e);
            None
        }
    }
}

#[cfg(not(feature = "ai"))]
pub fn build_explainer(config: &ServerConfig) -> Option<Arc<dyn ExplanationProvider>> {
    if config.explain_provider != ExplainProviderKind::None {
        warn!("Built without the `ai` feature, using rule-based explanations");
    }
    None
}

static_assertions::assert_impl_all!(AppState: Send, Sync, Clone);
