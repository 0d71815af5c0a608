use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;

use super::{SessionError, SessionLookup, SessionProvider, SessionUser, UserType};

/// Body of the identity service's get-session endpoint; the whole body may be `null`
#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    #[serde(default)]
    user: Option<IdentityUser>,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: String,
    #[serde(rename = "type", default)]
    user_type: Option<UserType>,
}

/// Asks the remote identity service for the current session
pub struct HttpSessionProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSessionProvider {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, endpoint })
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        let mut request = self.client.get(&self.endpoint);
        // Only the headers that identify the caller
        for name in [header::COOKIE, header::AUTHORIZATION] {
            for value in headers.get_all(&name) {
                request = request.header(&name, value);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::UnexpectedStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let envelope: Option<SessionEnvelope> =
            serde_json::from_slice(&bytes).map_err(|e| SessionError::Decode(e.to_string()))?;

        Ok(envelope.and_then(|e| e.user).map(|user| SessionUser {
            id: user.id,
            user_type: user.user_type.unwrap_or_default(),
        }))
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn lookup(&self, headers: &HeaderMap) -> SessionLookup {
        self.resolve(headers).await.into()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
