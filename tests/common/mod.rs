#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use kioskfy_edge::app::{app, EdgeState};
use kioskfy_edge::config::{AppConfig, RoutingConfig};
use kioskfy_edge::session::{SessionLookup, SessionProvider};

pub const ROOT_DOMAIN: &str = "kioskfy.com";

/// Session provider that answers the same lookup for every request
pub struct StaticSessions(pub SessionLookup);

#[async_trait]
impl SessionProvider for StaticSessions {
    async fn lookup(&self, _headers: &HeaderMap) -> SessionLookup {
        self.0.clone()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Serve `router` on a free local port and return its base URL
pub async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(format!("http://127.0.0.1:{}", port))
}

/// Base URL nothing listens on
pub fn dead_upstream() -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    Ok(format!("http://127.0.0.1:{}", port))
}

/// Origin stand-in: echoes what it received, plus one redirecting route
pub async fn spawn_origin() -> Result<String> {
    let router = Router::new()
        .route("/moved", get(|| async { Redirect::temporary("/elsewhere") }))
        .fallback(echo);
    serve(router).await
}

async fn echo(request: Request) -> Response {
    let mut payload = {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null)
    };

    json!({
        "method": request.method().as_str(),
        "uri": request.uri().to_string(),
        "tenant": header("x-kioskfy-tenant"),
        "original_path": header("x-kioskfy-original-path"),
        "forwarded_host": header("x-forwarded-host"),
        "cookie": header("cookie"),
    })
    };

    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    payload["body"] = Value::String(String::from_utf8_lossy(&bytes).into_owned());

    Json(payload).into_response()
}

pub fn test_config(upstream: &str) -> AppConfig {
    let mut config = AppConfig::development();
    config.routing = RoutingConfig::new(ROOT_DOMAIN);
    config.server.upstream_url = upstream.to_string();
    config.server.upstream_timeout_secs = 5;
    config
}

/// Edge app in front of `upstream` with a fixed session
pub fn edge(upstream: &str, session: SessionLookup) -> Result<Router> {
    edge_with(test_config(upstream), Arc::new(StaticSessions(session)))
}

pub fn edge_with(config: AppConfig, sessions: Arc<dyn SessionProvider>) -> Result<Router> {
    let state = EdgeState::new(config, sessions)?;
    Ok(app(Arc::new(state)))
}

pub async fn send(app: &Router, request: Request) -> Result<Response> {
    Ok(app.clone().oneshot(request).await?)
}

pub async fn get_path(app: &Router, host: &str, path_and_query: &str) -> Result<Response> {
    let request = Request::builder()
        .uri(path_and_query)
        .header("host", host)
        .body(Body::empty())?;
    send(app, request).await
}

pub async fn json_body(response: Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
