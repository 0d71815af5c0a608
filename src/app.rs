use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::handlers;
use crate::middleware::tenant_edge_middleware;
use crate::routing::RouteTables;
use crate::session::{provider_from_config, SessionProvider};
use crate::upstream::Forwarder;

/// Read-only state shared by every request
pub struct EdgeState {
    pub config: AppConfig,
    pub routes: RouteTables,
    pub sessions: Arc<dyn SessionProvider>,
    pub forwarder: Forwarder,
}

impl EdgeState {
    pub fn new(config: AppConfig, sessions: Arc<dyn SessionProvider>) -> anyhow::Result<Self> {
        let forwarder = Forwarder::new(
            &config.server.upstream_url,
            Duration::from_secs(config.server.upstream_timeout_secs),
            config.server.max_body_bytes,
            &config.routing.default_scheme,
        )?;

        Ok(Self {
            config,
            routes: RouteTables::default(),
            sessions,
            forwarder,
        })
    }

    /// State with the session provider selected by configuration
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let sessions = provider_from_config(&config.session)?;
        Self::new(config, sessions)
    }
}

/// Build the edge application.
///
/// The tenant middleware wraps an outer router whose only job is to hand
/// every request to the inner one. Middleware on a router runs after that
/// router has matched, so this way the rewrite lands before the inner
/// router picks a handler.
pub fn app(state: Arc<EdgeState>) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .fallback(handlers::forward)
        .with_state(state.clone());

    Router::new()
        .fallback_service(routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            tenant_edge_middleware,
        ))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
