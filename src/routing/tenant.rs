use serde::Serialize;

use super::RouteTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantKind {
    Admin,
    Labo,
    Storefront,
}

/// Where a tenant host is served from on the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantTarget {
    pub token: String,
    pub kind: TenantKind,
    /// Path prefix on the origin, e.g. `/admin` or `/acme`
    pub prefix: String,
}

impl TenantTarget {
    /// Map a subdomain token to a target, or `None` when the host is not a tenant host.
    ///
    /// Unknown tokens are treated as storefront slugs; whether the slug exists
    /// is for the origin to decide.
    pub fn from_token(token: Option<&str>, tables: &RouteTables) -> Option<Self> {
        let token = token?;

        if tables.non_tenant_tokens.iter().any(|t| t == token) {
            return None;
        }

        if let Some(reserved) = tables.reserved_tokens.iter().find(|r| r.token == token) {
            return Some(Self {
                token: token.to_string(),
                kind: reserved.kind,
                prefix: reserved.prefix.clone(),
            });
        }

        Some(Self {
            token: token.to_string(),
            kind: TenantKind::Storefront,
            prefix: format!("/{}", token),
        })
    }

    pub fn rewrite_path(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path)
    }
}
