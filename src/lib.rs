pub mod api; // HTTP surface: /chat, /healthz, /config
pub mod config;
pub mod pipeline; // Safety screen + triage orchestration around the model

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::server::{start_server_on, ServerError};
use crate::config::{AppConfig, ConfigError, LlmProvider};
use crate::pipeline::triage::TriagePipeline;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Install the global tracing subscriber (`RUST_LOG` overrides the default filter).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load configuration, serve the triage API, and stop on Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    init_tracing();

    tracing::info!("MedAssist starting v{}", config::APP_VERSION);
    tracing::info!(
        provider = ?config.provider,
        model = %config.model_name,
        require_password = config.require_password(),
        allow_logging = config.allow_logging,
        "Configuration loaded"
    );
    if config.provider == LlmProvider::OpenAi && config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; /chat will answer 502 until it is");
    }

    let pipeline = Arc::new(TriagePipeline::from_config(&config));
    let mut server = start_server_on(pipeline, config.bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.stopped().await;

    tracing::info!("MedAssist stopped");
    Ok(())
}
