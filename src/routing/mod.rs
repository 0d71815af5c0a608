//! Tenant resolution and access gating.
//!
//! Every request runs through the same ordered pipeline:
//! applicability filter → hostname parser → path classifier → tenant router
//! → access gate. Each stage is a pure function over [`RouteTables`], so the
//! whole decision can be exercised without an HTTP server.

pub mod classify;
pub mod decision;
pub mod gate;
pub mod host;
pub mod matcher;
pub mod tenant;

use serde::Serialize;

use crate::session::UserType;

pub use classify::{classify_path, PathClass};
pub use decision::{decide, EdgeDecision, RequestFacts};
pub use gate::gate;
pub use host::resolve_subdomain;
pub use matcher::applies;
pub use tenant::{TenantKind, TenantTarget};

/// A subdomain that maps onto a console instead of a storefront
#[derive(Debug, Clone, Serialize)]
pub struct ReservedToken {
    pub token: String,
    pub kind: TenantKind,
    pub prefix: String,
}

/// Route match lists consulted by the pipeline, in evaluation order
#[derive(Debug, Clone, Serialize)]
pub struct RouteTables {
    /// Tokens that mean "no tenant" (the bare-host literal and `www`)
    pub non_tenant_tokens: Vec<String>,
    pub reserved_tokens: Vec<ReservedToken>,
    /// Framework internals, API and static files
    pub static_prefixes: Vec<String>,
    /// Host-agnostic authentication pages
    pub shared_auth_prefixes: Vec<String>,
    pub protected_routes: Vec<String>,
    pub public_routes: Vec<String>,
    /// Where an already signed-in user of each type is sent from a public route
    pub home_areas: Vec<(UserType, String)>,
    pub login_path: String,
    pub redirect_param: String,
    pub error_param: String,
}

impl Default for RouteTables {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            non_tenant_tokens: owned(&["", "www"]),
            reserved_tokens: vec![
                ReservedToken {
                    token: "admin".to_string(),
                    kind: TenantKind::Admin,
                    prefix: "/admin".to_string(),
                },
                ReservedToken {
                    token: "labo".to_string(),
                    kind: TenantKind::Labo,
                    prefix: "/organization".to_string(),
                },
            ],
            static_prefixes: owned(&["/_next", "/api", "/static"]),
            shared_auth_prefixes: owned(&["/login", "/register", "/forgot-password"]),
            protected_routes: owned(&["/admin", "/dashboard", "/organization/dashboard"]),
            public_routes: owned(&[
                "/organization/login",
                "/organization/subscription",
                "/login",
                "/register",
            ]),
            home_areas: vec![
                (UserType::Client, "/dashboard".to_string()),
                (UserType::Agency, "/organization/dashboard".to_string()),
            ],
            login_path: "/login".to_string(),
            redirect_param: "redirect".to_string(),
            error_param: "error".to_string(),
        }
    }
}

impl RouteTables {
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_routes.iter().any(|route| matches_route(path, route))
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_routes.iter().any(|route| matches_route(path, route))
    }

    pub fn home_area(&self, user_type: UserType) -> Option<&str> {
        self.home_areas
            .iter()
            .find(|(t, _)| *t == user_type)
            .map(|(_, home)| home.as_str())
    }
}

/// Exact match, or `route` followed by a path separator
pub fn matches_route(path: &str, route: &str) -> bool {
    match path.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_route_requires_segment_boundary() {
        assert!(matches_route("/dashboard", "/dashboard"));
        assert!(matches_route("/dashboard/orders", "/dashboard"));
        assert!(!matches_route("/dashboards", "/dashboard"));
        assert!(!matches_route("/", "/dashboard"));
    }

    #[test]
    fn test_default_tables() {
        let tables = RouteTables::default();
        assert!(tables.is_protected("/organization/dashboard/stats"));
        assert!(tables.is_protected("/admin"));
        assert!(!tables.is_protected("/organization/login"));
        assert!(tables.is_public("/organization/subscription/plan"));
        assert!(tables.is_public("/register"));
        assert!(!tables.is_public("/forgot-password"));
        assert_eq!(tables.home_area(UserType::Client), Some("/dashboard"));
        assert_eq!(tables.home_area(UserType::Agency), Some("/organization/dashboard"));
        assert_eq!(tables.home_area(UserType::None), None);
    }
}
