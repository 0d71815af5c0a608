use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::EdgeState;

/// GET /health - edge liveness plus origin reachability
///
/// Reachable only on non-tenant hosts; on a tenant host the path is
/// rewritten and answered by the origin like any other page.
pub async fn health(State(state): State<Arc<EdgeState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let session_provider = state.sessions.name();

    if state.forwarder.check_health().await {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "upstream": "ok",
                    "session_provider": session_provider
                }
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "upstream unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "session_provider": session_provider
                }
            })),
        )
    }
}
