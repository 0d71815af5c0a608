use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kioskfy_edge::app::{app, EdgeState};
use kioskfy_edge::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up ROOT_DOMAIN, UPSTREAM_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kioskfy_edge=info,tower_http=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Kioskfy edge in {:?} mode", config.environment);
    tracing::info!(
        root_domain = %config.routing.root_domain,
        upstream = %config.server.upstream_url,
        session_provider = ?config.session.provider,
        "Edge configuration loaded"
    );

    let port = config.server.port;
    let state = Arc::new(EdgeState::from_config(config)?);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Kioskfy edge listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;

    Ok(())
}
