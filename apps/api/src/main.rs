mod config;
mod errors;
mod llm_client;
mod routes;
mod screening;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{BackendKind, Config};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::backend::{LlmBackend, MockBackend, RemoteBackend, ScreeningBackend};
use crate::screening::pipeline::Screener;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on env vars the selected backend needs)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    let backend = build_backend(&config)?;
    info!("Screening backend: {}", backend.name());

    let state = AppState {
        screener: Arc::new(Screener::new(backend)),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the review UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wires the configured screening capability. Every outbound call shares
/// the one request timeout.
fn build_backend(config: &Config) -> Result<Arc<dyn ScreeningBackend>> {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let backend: Arc<dyn ScreeningBackend> = match config.backend {
        BackendKind::Llm => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for the llm backend")?;
            let llm = LlmClient::new(api_key, timeout)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmBackend::new(
                llm,
                http_client(timeout)?,
                config.item_concurrency,
            ))
        }
        BackendKind::Remote => {
            let base_url = config
                .processor_base_url
                .clone()
                .context("PROCESSOR_BASE_URL is required for the remote backend")?;
            info!("Processor service at {base_url}");
            Arc::new(RemoteBackend::new(http_client(timeout)?, base_url))
        }
        BackendKind::Mock => Arc::new(MockBackend::new(config.mock_delay_ms)),
    };

    Ok(backend)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}
