use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::Response,
};

use crate::app::EdgeState;
use crate::error::ApiError;

/// Fallback for every path the edge does not serve itself
pub async fn forward(State(state): State<Arc<EdgeState>>, request: Request) -> Result<Response, ApiError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.forwarder.forward(request).await.map_err(|e| {
        tracing::warn!(%method, %path, error = %e, "Forwarding to upstream failed");
        ApiError::from(e)
    })
}
