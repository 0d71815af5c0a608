use async_trait::async_trait;
use axum::http::HeaderMap;

use super::{cookie_value, SessionError, SessionLookup, SessionProvider, SessionUser};
use crate::auth::{validate_session_token, JwtError};

/// Verifies self-contained session tokens locally
pub struct JwtSessionProvider {
    secret: String,
    cookie_name: String,
}

impl JwtSessionProvider {
    pub fn new(secret: String, cookie_name: String) -> Self {
        Self { secret, cookie_name }
    }

    fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::MissingSecret);
        }

        let Some(token) = extract_token(headers, &self.cookie_name) else {
            return Ok(None);
        };

        match validate_session_token(&token, &self.secret) {
            Ok(claims) => Ok(Some(claims.into())),
            // A bad credential is an anonymous caller, not an identity outage
            Err(JwtError::InvalidToken(msg)) => {
                tracing::debug!("Ignoring invalid session token: {}", msg);
                Ok(None)
            }
            Err(JwtError::InvalidSecret) => Err(SessionError::MissingSecret),
            Err(JwtError::TokenGeneration(msg)) => Err(SessionError::Decode(msg)),
        }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn lookup(&self, headers: &HeaderMap) -> SessionLookup {
        self.resolve(headers).into()
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

/// Bearer token first, then the session cookie
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => cookie_value(headers, cookie_name),
    }
}
