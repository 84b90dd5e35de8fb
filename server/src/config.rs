//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first) and can
//! be overridden by CLI flags before [`ServerConfig::validate`] runs.

use eda_processing::LoadOptions;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 100;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;
const BYTES_PER_MB: usize = 1024 * 1024;

/// Which remote model (if any) writes the `/explain` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplainProviderKind {
    OpenRouter,
    Anthropic,
    /// Rule-based explanations only.
    #[default]
    None,
}

impl FromStr for ExplainProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(Self::OpenRouter),
            "anthropic" => Ok(Self::Anthropic),
            "none" | "rules" | "" => Ok(Self::None),
            other => Err(ConfigError::InvalidValue {
                key: "EXPLAIN_PROVIDER".to_string(),
                reason: format!("unknown provider '{other}' (expected openrouter, anthropic or none)"),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Idle time after which a session is evicted.
    pub session_ttl: Duration,
    /// Upper bound on live sessions; the least recently used one is evicted first.
    pub max_sessions: usize,
    pub max_upload_bytes: usize,
    /// Allowed CORS origins. Empty means no cross-origin access.
    pub allowed_origins: Vec<String>,
    pub explain_provider: ExplainProviderKind,
    pub openrouter_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub explain_model: Option<String>,
    pub load: LoadOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * BYTES_PER_MB,
            allowed_origins: Vec::new(),
            explain_provider: ExplainProviderKind::None,
            openrouter_api_key: None,
            anthropic_api_key: None,
            explain_model: None,
            load: LoadOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            host: parse_or(get("HOST"), "HOST", defaults.host)?,
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            session_ttl: Duration::from_secs(parse_or(
                get("SESSION_TTL_SECS"),
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?),
            max_sessions: parse_or(get("MAX_SESSIONS"), "MAX_SESSIONS", defaults.max_sessions)?,
            max_upload_bytes: parse_or(get("MAX_UPLOAD_MB"), "MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)?
                .saturating_mul(BYTES_PER_MB),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            explain_provider: get("EXPLAIN_PROVIDER")
                .map(|v| v.parse::<ExplainProviderKind>())
                .transpose()?
                .unwrap_or_default(),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            explain_model: get("EXPLAIN_MODEL"),
            load: defaults.load,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl.is_zero() {
            return Err(invalid("SESSION_TTL_SECS", "must be at least 1 second"));
        }
        if self.max_sessions == 0 {
            return Err(invalid("MAX_SESSIONS", "must be at least 1"));
        }
        if self.max_upload_bytes == 0 {
            return Err(invalid("MAX_UPLOAD_MB", "must be at least 1"));
        }
        match self.explain_provider {
            ExplainProviderKind::OpenRouter if self.openrouter_api_key.is_none() => {
                return Err(ConfigError::MissingRequired {
                    key: "OPENROUTER_API_KEY".to_string(),
                });
            }
            ExplainProviderKind::Anthropic if self.anthropic_api_key.is_none() => {
                return Err(ConfigError::MissingRequired {
                    key: "ANTHROPIC_API_KEY".to_string(),
                });
            }
            _ => {}
        }
        self.load
            .validate()
            .map_err(|e| invalid("load options", &e.to_string()))
    }

    /// How often the background task sweeps expired sessions.
    pub fn sweep_interval(&self) -> Duration {
        (self.session_ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {} value '{}': {}", key, value, e);
            invalid(key, &format!("'{value}': {e}"))
        }),
    }
}

/// Builder for [`ServerConfig`], used by the binary's flag overrides and by tests.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    base: Option<ServerConfig>,
    host: Option<IpAddr>,
    port: Option<u16>,
    session_ttl: Option<Duration>,
    max_sessions: Option<usize>,
    max_upload_bytes: Option<usize>,
    allowed_origins: Option<Vec<String>>,
    load: Option<LoadOptions>,
}

impl ServerConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn base(mut self, config: ServerConfig) -> Self {
        self.base = Some(config);
        self
    }

    pub fn host(mut self, host: IpAddr) -> Self {
        self.host = Some(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = Some(max);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = Some(bytes);
        self
    }

    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Some(origins);
        self
    }

    pub fn load_options(mut self, load: LoadOptions) -> Self {
        self.load = Some(load);
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let mut config = self.base.unwrap_or_default();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ttl) = self.session_ttl {
            config.session_ttl = ttl;
        }
        if let Some(max) = self.max_sessions {
            config.max_sessions = max;
        }
        if let Some(bytes) = self.max_upload_bytes {
            config.max_upload_bytes = bytes;
        }
        if let Some(origins) = self.allowed_origins {
            config.allowed_origins = origins;
        }
        if let Some(load) = self.load {
            config.load = load;
        }

        config.validate()?;
        Ok(config)
    }
}
