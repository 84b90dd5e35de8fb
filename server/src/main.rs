//! Binary entry point for the EDA HTTP backend.

use anyhow::{Context, Result};
use clap::Parser;
use eda_server::{AppState, ServerConfig, app, build_explainer};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "eda-server",
    version,
    about = "HTTP backend for CSV profiling, risk scoring and cleaning comparison",
    after_help = "\
                  ENVIRONMENT VARIABLES:\n  \
                  HOST, PORT              Bind address (default 0.0.0.0:8000)\n  \
                  SESSION_TTL_SECS        Idle time before a session expires\n  \
                  MAX_SESSIONS            Live session limit (LRU eviction)\n  \
                  MAX_UPLOAD_MB           Upload size limit\n  \
                  ALLOWED_ORIGINS         Comma-separated CORS origins\n  \
                  EXPLAIN_PROVIDER        openrouter | anthropic | none\n  \
                  OPENROUTER_API_KEY      Key for OpenRouter explanations\n  \
                  ANTHROPIC_API_KEY       Key for Anthropic explanations\n  \
                  EXPLAIN_MODEL           Model override for the provider\n  \
                  LOG_LEVEL / RUST_LOG    Log filter"
)]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Idle seconds before a session expires (overrides SESSION_TTL_SECS)
    #[arg(long)]
    session_ttl_secs: Option<u64>,

    /// Maximum live sessions (overrides MAX_SESSIONS)
    #[arg(long)]
    max_sessions: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--log-level`, which wins over `LOG_LEVEL`.
fn init_logging(level: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let level = level
        .map(str::to_string)
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging(args.log_level.as_deref());

    let mut builder = ServerConfig::builder().base(ServerConfig::from_env()?);
    if let Some(host) = args.host {
        builder = builder.host(host);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(ttl) = args.session_ttl_secs {
        builder = builder.session_ttl(Duration::from_secs(ttl));
    }
    if let Some(max) = args.max_sessions {
        builder = builder.max_sessions(max);
    }
    let config = builder.build()?;

    // The remote providers hold blocking HTTP clients.
    let provider_config = config.clone();
    let explainer = tokio::task::spawn_blocking(move || build_explainer(&provider_config))
        .await
        .context("building explanation provider")?;

    let addr = config.bind_addr();
    let sweep_interval = config.sweep_interval();
    let state = AppState::new(config, explainer);

    spawn_session_sweeper(Arc::clone(&state.sessions), sweep_interval);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("eda-server listening on {}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn spawn_session_sweeper(sessions: Arc<eda_server::SessionStore>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_expired();
            if evicted > 0 {
                info!("Evicted {} expired session(s)", evicted);
            } else {
                debug!("Session sweep: nothing expired ({} live)", sessions.len());
            }
        }
    });
}
