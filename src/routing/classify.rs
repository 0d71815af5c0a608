use serde::Serialize;

use super::RouteTables;

/// How a path relates to tenant rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathClass {
    /// Framework internals, API routes and files: always passed through untouched
    Static,
    /// Login/registration pages: never rewritten to a tenant, still gated
    SharedAuth,
    Routable,
}

impl PathClass {
    pub fn is_exempt_from_rewrite(self) -> bool {
        !matches!(self, PathClass::Routable)
    }
}

pub fn classify_path(path: &str, tables: &RouteTables) -> PathClass {
    let is_static = tables.static_prefixes.iter().any(|p| path.starts_with(p.as_str()))
        // anything with an extension that slipped past the entry matcher
        || path.contains('.');

    if is_static {
        PathClass::Static
    } else if tables.shared_auth_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
        PathClass::SharedAuth
    } else {
        PathClass::Routable
    }
}
