//! HTTP API over the live plant.
//!
//! A single [`AppState`] holds the plant behind a lock. A background ticker
//! advances it at a fixed wall-clock rate while axum handlers serve reads and
//! operator overrides under `/api/scada`.

pub mod config;
mod error;
mod routes;
mod state;
mod ticker;

pub use config::{ConfigError, ServerConfig};
pub use error::ServerError;
pub use routes::router;
pub use state::AppState;
pub use ticker::spawn_ticker;

use scada_layout::Layout;

/// Build the plant from `config` and serve it until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    let layout = match &config.layout {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading layout");
            Layout::load(path)?
        }
        None => Layout::builtin(),
    };

    let state = AppState::new(layout, &config)?;
    let ticker = spawn_ticker(state.clone(), config.tick_interval());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "SCADA API listening");

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    ticker.abort();
    tracing::info!("server stopped");
    result.map_err(ServerError::from)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
