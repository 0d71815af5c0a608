use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::app::EdgeState;
use crate::error::ApiError;
use crate::routing::{decide, EdgeDecision, RequestFacts, TenantTarget};

/// Headers in this namespace are set by the edge only
pub const EDGE_HEADER_PREFIX: &str = "x-kioskfy-";

/// Marks a request the edge has already rewritten
#[derive(Clone, Debug)]
pub struct Rewritten {
    pub original_path: String,
    pub target: TenantTarget,
}

/// Tenant resolution and access gating for every inbound request.
///
/// Must wrap the router from the outside so a rewritten URI is what the
/// router (and the forwarder behind it) sees.
pub async fn tenant_edge_middleware(
    State(state): State<Arc<EdgeState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    strip_edge_headers(request.headers_mut());

    let mut facts = RequestFacts::from_request(
        request.uri(),
        request.headers(),
        &state.config.routing.default_scheme,
    );
    facts.rewritten = request.extensions().get::<Rewritten>().is_some();

    let headers = request.headers();
    let decision = decide(&facts, &state.routes, &state.config.routing, || {
        state.sessions.lookup(headers)
    })
    .await;

    match decision {
        EdgeDecision::PassThrough => Ok(next.run(request).await),
        EdgeDecision::Rewrite { path, target } => {
            let rewritten = match &facts.query {
                Some(query) => format!("{}?{}", path, query),
                None => path,
            };
            let uri: Uri = rewritten.parse().map_err(|e| {
                tracing::warn!("Rewrite produced an invalid URI '{}': {}", rewritten, e);
                ApiError::bad_request("Invalid request path")
            })?;

            *request.uri_mut() = uri;
            request.extensions_mut().insert(Rewritten {
                original_path: facts.path,
                target,
            });

            Ok(next.run(request).await)
        }
        EdgeDecision::Redirect { location } => Ok(Redirect::temporary(&location).into_response()),
    }
}

fn strip_edge_headers(headers: &mut HeaderMap) {
    let spoofed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(EDGE_HEADER_PREFIX))
        .cloned()
        .collect();

    for name in spoofed {
        tracing::debug!("Dropping client-supplied {} header", name);
        headers.remove(&name);
    }
}
