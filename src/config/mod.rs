use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub routing: RoutingConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL of the origin that serves the path-based pages
    pub upstream_url: String,
    pub upstream_timeout_secs: u64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Root domain, optionally with a port (e.g. "localhost:3000")
    pub root_domain: String,
    /// Domain under which `tenant---branch.<domain>` preview hosts live.
    /// Falls back to the root domain when unset.
    pub preview_domain: Option<String>,
    /// Scheme used to rebuild the full request URL when no x-forwarded-proto is present
    pub default_scheme: String,
}

impl RoutingConfig {
    pub fn new(root_domain: impl Into<String>) -> Self {
        Self {
            root_domain: root_domain.into(),
            preview_domain: None,
            default_scheme: "http".to_string(),
        }
    }

    pub fn preview_domain(&self) -> &str {
        self.preview_domain.as_deref().unwrap_or(&self.root_domain)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionProviderKind {
    Jwt,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub provider: SessionProviderKind,
    pub jwt_secret: String,
    pub cookie_name: String,
    /// Identity service endpoint returning the current session as JSON
    pub identity_url: String,
    pub lookup_timeout_ms: u64,
    pub token_ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid upstream URL '{0}': {1}")]
    InvalidUpstreamUrl(String, url::ParseError),

    #[error("Invalid identity URL '{0}': {1}")]
    InvalidIdentityUrl(String, url::ParseError),

    #[error("Unknown session provider: {0}")]
    UnknownSessionProvider(String),

    #[error("Root domain must not be empty")]
    EmptyRootDomain,

    #[error("SESSION_JWT_SECRET is required outside development")]
    MissingJwtSecret,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(port) = env::var("KIOSKFY_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("UPSTREAM_URL") {
            self.server.upstream_url = v;
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_SECS") {
            self.server.upstream_timeout_secs = v.parse().unwrap_or(self.server.upstream_timeout_secs);
        }
        if let Ok(v) = env::var("MAX_BODY_BYTES") {
            self.server.max_body_bytes = v.parse().unwrap_or(self.server.max_body_bytes);
        }

        // Routing overrides
        if let Ok(v) = env::var("ROOT_DOMAIN").or_else(|_| env::var("NEXT_PUBLIC_ROOT_DOMAIN")) {
            self.routing.root_domain = v;
        }
        if let Ok(v) = env::var("PREVIEW_DOMAIN") {
            self.routing.preview_domain = Some(v).filter(|d| !d.is_empty());
        }
        if let Ok(v) = env::var("DEFAULT_SCHEME") {
            self.routing.default_scheme = v;
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_PROVIDER") {
            self.session.provider = match v.to_ascii_lowercase().as_str() {
                "jwt" => SessionProviderKind::Jwt,
                "http" => SessionProviderKind::Http,
                _ => return Err(ConfigError::UnknownSessionProvider(v)),
            };
        }
        if let Ok(v) = env::var("SESSION_JWT_SECRET") {
            self.session.jwt_secret = v;
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("IDENTITY_URL") {
            self.session.identity_url = v;
        }
        if let Ok(v) = env::var("SESSION_LOOKUP_TIMEOUT_MS") {
            self.session.lookup_timeout_ms = v.parse().unwrap_or(self.session.lookup_timeout_ms);
        }
        if let Ok(v) = env::var("SESSION_TOKEN_TTL_HOURS") {
            self.session.token_ttl_hours = v.parse().unwrap_or(self.session.token_ttl_hours);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routing.root_domain.trim().is_empty() {
            return Err(ConfigError::EmptyRootDomain);
        }

        url::Url::parse(&self.server.upstream_url)
            .map_err(|e| ConfigError::InvalidUpstreamUrl(self.server.upstream_url.clone(), e))?;

        match self.session.provider {
            SessionProviderKind::Http => {
                url::Url::parse(&self.session.identity_url)
                    .map_err(|e| ConfigError::InvalidIdentityUrl(self.session.identity_url.clone(), e))?;
            }
            SessionProviderKind::Jwt => {
                if self.session.jwt_secret.is_empty() && self.environment != Environment::Development {
                    return Err(ConfigError::MissingJwtSecret);
                }
            }
        }

        Ok(())
    }

    /// Copy of the config that is safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.session.jwt_secret.is_empty() {
            copy.session.jwt_secret = "********".to_string();
        }
        copy
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                upstream_url: "http://127.0.0.1:3001".to_string(),
                upstream_timeout_secs: 30,
                max_body_bytes: 10 * 1024 * 1024, // 10MB
            },
            routing: RoutingConfig::new("localhost:3000"),
            session: SessionConfig {
                provider: SessionProviderKind::Jwt,
                jwt_secret: "kioskfy-dev-secret".to_string(),
                cookie_name: "kioskfy_session".to_string(),
                identity_url: "http://127.0.0.1:3001/api/auth/get-session".to_string(),
                lookup_timeout_ms: 2000,
                token_ttl_hours: 24 * 7, // 1 week
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                upstream_url: "http://127.0.0.1:3001".to_string(),
                upstream_timeout_secs: 15,
                max_body_bytes: 5 * 1024 * 1024, // 5MB
            },
            routing: RoutingConfig {
                root_domain: "staging.kioskfy.com".to_string(),
                preview_domain: None,
                default_scheme: "https".to_string(),
            },
            session: SessionConfig {
                provider: SessionProviderKind::Http,
                jwt_secret: String::new(),
                cookie_name: "kioskfy_session".to_string(),
                identity_url: "http://127.0.0.1:3001/api/auth/get-session".to_string(),
                lookup_timeout_ms: 1500,
                token_ttl_hours: 24,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.kioskfy.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                upstream_url: "http://127.0.0.1:3001".to_string(),
                upstream_timeout_secs: 10,
                max_body_bytes: 2 * 1024 * 1024, // 2MB
            },
            routing: RoutingConfig {
                root_domain: "kioskfy.com".to_string(),
                preview_domain: None,
                default_scheme: "https".to_string(),
            },
            session: SessionConfig {
                provider: SessionProviderKind::Http,
                jwt_secret: String::new(),
                cookie_name: "kioskfy_session".to_string(),
                identity_url: "http://127.0.0.1:3001/api/auth/get-session".to_string(),
                lookup_timeout_ms: 1000,
                token_ttl_hours: 4,
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: vec!["https://kioskfy.com".to_string()],
            },
        }
    }
}
