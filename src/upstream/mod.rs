// Upstream forwarding
//
// Relays pass-through and rewritten requests to the origin that serves the
// path-based pages, and relays the origin's answer back unchanged. Origin
// redirects are returned to the client, never followed here.

use std::time::Duration;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use thiserror::Error;
use tracing::warn;

use crate::middleware::Rewritten;

/// Tenant token of a rewritten request, for the origin's page loader
pub const TENANT_HEADER: &str = "x-kioskfy-tenant";
/// Path the client asked for before the rewrite
pub const ORIGINAL_PATH_HEADER: &str = "x-kioskfy-original-path";

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    ReadBody(String),

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("Invalid upstream response: {0}")]
    Response(String),
}

/// HTTP client for the origin
pub struct Forwarder {
    client: reqwest::Client,
    base_url: String,
    default_scheme: String,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_body_bytes: usize,
        default_scheme: &str,
    ) -> Result<Self, ForwardError> {
        url::Url::parse(base_url).map_err(|e| ForwardError::InvalidTarget(format!("{}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_scheme: default_scheme.to_string(),
            max_body_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward a request to the origin, using its (possibly rewritten) URI
    pub async fn forward(&self, request: Request) -> Result<Response, ForwardError> {
        let (parts, body) = request.into_parts();

        let declared_length = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared_length.is_some_and(|len| len > self.max_body_bytes) {
            return Err(ForwardError::BodyTooLarge {
                limit: self.max_body_bytes,
            });
        }

        let body_bytes = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| ForwardError::ReadBody(e.to_string()))?;

        let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let target_url = format!("{}{}", self.base_url, path_and_query);

        let headers = self.upstream_headers(&parts.headers, parts.extensions.get::<Rewritten>());

        let response = self
            .client
            .request(parts.method, &target_url)
            .headers(headers)
            .body(body_bytes)
            .send()
            .await?;

        let status = response.status();
        let mut builder = Response::builder().status(status);
        for (name, value) in response.headers() {
            if !is_hop_by_hop(name) {
                builder = builder.header(name, value);
            }
        }

        let bytes = response.bytes().await?;

        builder
            .body(Body::from(bytes))
            .map_err(|e| ForwardError::Response(e.to_string()))
    }

    fn upstream_headers(&self, inbound: &HeaderMap, rewritten: Option<&Rewritten>) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(inbound.len() + 4);

        for (name, value) in inbound {
            if name == header::HOST || name == header::CONTENT_LENGTH || is_hop_by_hop(name) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        if let Some(host) = inbound.get(header::HOST) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host.clone());
        }
        if !headers.contains_key("x-forwarded-proto") {
            if let Ok(scheme) = HeaderValue::from_str(&self.default_scheme) {
                headers.insert(HeaderName::from_static("x-forwarded-proto"), scheme);
            }
        }

        if let Some(rewritten) = rewritten {
            match (
                HeaderValue::from_str(&rewritten.target.token),
                HeaderValue::from_str(&rewritten.original_path),
            ) {
                (Ok(token), Ok(path)) => {
                    headers.insert(HeaderName::from_static(TENANT_HEADER), token);
                    headers.insert(HeaderName::from_static(ORIGINAL_PATH_HEADER), path);
                }
                _ => warn!("Skipping tenant headers for non-ASCII token '{}'", rewritten.target.token),
            }
        }

        headers
    }

    /// Any HTTP answer counts as reachable; only transport failures are unhealthy
    pub async fn check_health(&self) -> bool {
        match self
            .client
            .head(&self.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(upstream = %self.base_url, error = %e, "Upstream health check failed");
                false
            }
        }
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}
