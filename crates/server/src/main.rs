//! Copydesk dashboard server.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use server::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("server=info,pipeline=info,monitor=info,warn"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::from_env();
    let port = config.port;

    let state = AppState::initialize(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Dashboard server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
