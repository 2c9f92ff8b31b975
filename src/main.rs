use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tow_dispatch::config::Settings;
use tow_dispatch::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tow_dispatch=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    let settings = Settings::load()?;
    let addr: SocketAddr = settings
        .server
        .address
        .parse()
        .with_context(|| format!("Invalid server address: {}", settings.server.address))?;

    let state = AppState::from_settings(settings)?;
    if state.webhook.is_none() {
        tracing::warn!("No submission webhook configured; submissions will be refused");
    }

    let app = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Tow dispatch server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
