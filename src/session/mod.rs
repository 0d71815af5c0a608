//! Session lookup against the identity collaborator.
//!
//! A lookup never fails outright: outages and misconfiguration surface as
//! [`SessionLookup::LookupFailed`] so the access gate can decide explicitly
//! how to treat them.

pub mod http;
pub mod jwt;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SessionConfig, SessionProviderKind};

pub use http::HttpSessionProvider;
pub use jwt::JwtSessionProvider;

/// Account classification used by the access gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Client,
    Agency,
    #[default]
    #[serde(other)]
    None,
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(UserType::Client),
            "agency" => Ok(UserType::Agency),
            "none" => Ok(UserType::None),
            other => Err(format!("unknown user type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub user_type: UserType,
}

/// Outcome of asking the identity collaborator who is calling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Authenticated(SessionUser),
    Anonymous,
    LookupFailed(String),
}

impl SessionLookup {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionLookup::Authenticated(user) => Some(user),
            SessionLookup::Anonymous | SessionLookup::LookupFailed(_) => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionLookup::Authenticated(_) => "authenticated",
            SessionLookup::Anonymous => "anonymous",
            SessionLookup::LookupFailed(_) => "lookup_failed",
        }
    }
}

impl From<Result<Option<SessionUser>, SessionError>> for SessionLookup {
    fn from(result: Result<Option<SessionUser>, SessionError>) -> Self {
        match result {
            Ok(Some(user)) => SessionLookup::Authenticated(user),
            Ok(None) => SessionLookup::Anonymous,
            Err(e) => SessionLookup::LookupFailed(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session secret not configured")]
    MissingSecret,

    #[error("Identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Identity service returned status {0}")]
    UnexpectedStatus(u16),

    #[error("Identity service returned an unreadable session: {0}")]
    Decode(String),
}

/// Resolves the caller's session from request headers
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn lookup(&self, headers: &HeaderMap) -> SessionLookup;

    fn name(&self) -> &'static str;
}

/// Build the provider selected by configuration
pub fn provider_from_config(config: &SessionConfig) -> Result<Arc<dyn SessionProvider>, SessionError> {
    let provider: Arc<dyn SessionProvider> = match config.provider {
        SessionProviderKind::Jwt => Arc::new(JwtSessionProvider::new(
            config.jwt_secret.clone(),
            config.cookie_name.clone(),
        )),
        SessionProviderKind::Http => Arc::new(HttpSessionProvider::new(
            config.identity_url.clone(),
            std::time::Duration::from_millis(config.lookup_timeout_ms),
        )?),
    };
    Ok(provider)
}

/// Pull a cookie value out of the `cookie` header(s). HTTP/2 clients may
/// send one header field per cookie.
pub(crate) fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let prefix = format!("{}=", cookie_name);

    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .filter_map(|cookie| cookie.strip_prefix(&prefix))
        .find(|value| !value.is_empty())
        .map(|value| value.to_string())
}
