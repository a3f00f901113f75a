pub mod api;
pub mod audit;
pub mod authorization;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod directory;
pub mod documents;
pub mod identity;
pub mod models;
pub mod reports;
pub mod requests;
pub mod storage;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};
use crate::core_state::{CoreError, CoreState};

/// Startup failures surfaced to `main`.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Startup failed: {0}")]
    State(#[from] CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Read configuration, open the store and serve until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    let config = ServerConfig::from_env()?;

    // try_init: a subscriber may already be installed by an embedding binary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .try_init();

    tracing::info!(
        "{} starting v{}",
        config::APP_NAME,
        config::APP_VERSION
    );
    tracing::info!(data_dir = %config.data_dir.display(), bind = %config.bind_addr, "Configuration loaded");

    let core = Arc::new(CoreState::open(&config)?);

    if let Some(admin) = &config.bootstrap_admin {
        directory::bootstrap_admin(&core, &admin.email, &admin.password, &admin.name)?;
    }

    api::server::serve_until(core, config.bind_addr, api::server::shutdown_signal()).await?;
    Ok(())
}
