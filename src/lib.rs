pub mod api;
pub mod clock;
pub mod config;
pub mod core_state;
pub mod db;
pub mod directory;
pub mod models;
pub mod scheduling;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Errors that stop the service before it starts serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Initialize tracing, open the database and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Clinic scheduler starting v{}", config::APP_VERSION);

    let settings = config::Settings::from_env()?;
    let core = Arc::new(core_state::CoreState::from_settings(&settings));
    core.initialize()?;

    let server = api::start_api_server(core, settings.bind_addr).await?;
    tracing::info!(addr = %server.addr, offset = %settings.utc_offset, "Listening");

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    server.stop().await;
    Ok(())
}
