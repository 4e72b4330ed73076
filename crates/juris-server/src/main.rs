//! Juris — backend for a Brazilian-law study app.
//!
//! Every route is a thin configuration of the resilient external-call
//! invoker: build a prompt, hand it one of the credential pools, return
//! the result as JSON.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = juris_core::JurisConfig::from_env()?;
    let port = config.port;

    let state = Arc::new(AppState::new(config));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Juris server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
