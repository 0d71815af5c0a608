use std::future::Future;

use axum::http::{HeaderMap, Uri};
use serde::Serialize;
use url::form_urlencoded;

use super::{applies, classify_path, gate, resolve_subdomain, PathClass, RouteTables, TenantTarget};
use crate::config::RoutingConfig;
use crate::session::SessionLookup;

/// The parts of a request the edge decides on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFacts {
    /// Full URL as the client addressed it
    pub url: String,
    pub host: Option<String>,
    pub path: String,
    pub query: Option<String>,
    /// Set once the edge has rewritten this request
    pub rewritten: bool,
}

impl RequestFacts {
    pub fn new(scheme: &str, host: Option<&str>, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (path_and_query, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        Self {
            url: format!("{}://{}{}", scheme, host.unwrap_or_default(), path_and_query),
            host: host.map(|h| h.to_string()),
            path: path.to_string(),
            query,
            rewritten: false,
        }
    }

    /// Build facts from an incoming request. The scheme comes from
    /// `x-forwarded-proto` when a proxy in front of us set it.
    pub fn from_request(uri: &Uri, headers: &HeaderMap, default_scheme: &str) -> Self {
        let host = headers
            .get("host")
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()));
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(default_scheme);
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        Self::new(scheme, host, path_and_query)
    }

    /// True when `name` is present with a non-empty value
    pub fn has_param(&self, name: &str) -> bool {
        self.query.as_deref().is_some_and(|query| {
            form_urlencoded::parse(query.as_bytes()).any(|(key, value)| key == name && !value.is_empty())
        })
    }
}

/// Exactly one outcome per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EdgeDecision {
    PassThrough,
    /// Serve from `path` on the origin while the browser keeps its URL
    Rewrite { path: String, target: TenantTarget },
    Redirect { location: String },
}

/// Run the full pipeline for one request.
///
/// `session` is only awaited when the access gate is reached, so static and
/// tenant requests never touch the identity collaborator.
pub async fn decide<F, Fut>(
    facts: &RequestFacts,
    tables: &RouteTables,
    config: &RoutingConfig,
    session: F,
) -> EdgeDecision
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = SessionLookup>,
{
    if facts.rewritten || !applies(&facts.path) {
        return EdgeDecision::PassThrough;
    }

    let class = classify_path(&facts.path, tables);
    if class == PathClass::Static {
        return EdgeDecision::PassThrough;
    }

    let token = resolve_subdomain(&facts.url, facts.host.as_deref(), config);

    if let Some(target) = TenantTarget::from_token(token.as_deref(), tables) {
        // Shared auth pages on a tenant host are served unprefixed and ungated
        if class == PathClass::SharedAuth {
            tracing::debug!(token = %target.token, path = %facts.path, "Shared auth page on tenant host");
            return EdgeDecision::PassThrough;
        }

        tracing::debug!(token = %target.token, kind = ?target.kind, path = %facts.path, "Tenant rewrite");
        return EdgeDecision::Rewrite {
            path: target.rewrite_path(&facts.path),
            target,
        };
    }

    let session = session().await;
    let decision = gate(&session, &facts.path, facts.has_param(&tables.error_param), tables);
    tracing::debug!(session = session.label(), path = %facts.path, decision = ?decision, "Access gate");
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionUser, UserType};

    fn config() -> RoutingConfig {
        RoutingConfig::new("kioskfy.com")
    }

    fn facts(host: &str, path_and_query: &str) -> RequestFacts {
        RequestFacts::new("https", Some(host), path_and_query)
    }

    fn user(user_type: UserType) -> SessionLookup {
        SessionLookup::Authenticated(SessionUser {
            id: "u1".to_string(),
            user_type,
        })
    }

    async fn run(facts: &RequestFacts, session: SessionLookup) -> EdgeDecision {
        decide(facts, &RouteTables::default(), &config(), || async move { session }).await
    }

    #[test]
    fn test_request_facts_split_query() {
        let f = facts("acme.kioskfy.com", "/foo?x=1&error=2");
        assert_eq!(f.url, "https://acme.kioskfy.com/foo?x=1&error=2");
        assert_eq!(f.path, "/foo");
        assert_eq!(f.query.as_deref(), Some("x=1&error=2"));
        assert!(f.has_param("error"));
        assert!(!f.has_param("redirect"));
    }

    #[test]
    fn test_empty_error_param_is_absent() {
        assert!(!facts("kioskfy.com", "/login?error=").has_param("error"));
    }

    #[test]
    fn test_from_request_prefers_forwarded_proto() {
        let uri: Uri = "/catalog?page=2".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("host", "acme.kioskfy.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "https".parse().unwrap());

        let f = RequestFacts::from_request(&uri, &headers, "http");
        assert_eq!(f.url, "https://acme.kioskfy.com/catalog?page=2");
        assert_eq!(f.host.as_deref(), Some("acme.kioskfy.com"));
    }

    #[tokio::test]
    async fn test_tenant_rewrites() {
        let cases = [
            ("admin.kioskfy.com", "/admin/foo"),
            ("labo.kioskfy.com", "/organization/foo"),
            ("acme.kioskfy.com", "/acme/foo"),
            ("acme---preview.kioskfy.com", "/acme/foo"),
        ];
        for (host, expected) in cases {
            match run(&facts(host, "/foo"), SessionLookup::Anonymous).await {
                EdgeDecision::Rewrite { path, .. } => assert_eq!(path, expected, "host {}", host),
                other => panic!("expected rewrite for {}, got {:?}", host, other),
            }
        }
    }

    #[tokio::test]
    async fn test_static_paths_pass_on_every_host() {
        for host in ["kioskfy.com", "admin.kioskfy.com", "acme.kioskfy.com"] {
            for path in ["/_next/data/a.json", "/api/favorites", "/static/x", "/feed.xml"] {
                assert_eq!(
                    run(&facts(host, path), SessionLookup::Anonymous).await,
                    EdgeDecision::PassThrough,
                    "{}{}",
                    host,
                    path
                );
            }
        }
    }

    #[tokio::test]
    async fn test_shared_auth_not_rewritten_on_tenant_host() {
        assert_eq!(
            run(&facts("acme.kioskfy.com", "/login"), SessionLookup::Anonymous).await,
            EdgeDecision::PassThrough
        );
        assert_eq!(
            run(&facts("acme.kioskfy.com", "/forgot-password"), SessionLookup::Anonymous).await,
            EdgeDecision::PassThrough
        );
    }

    #[tokio::test]
    async fn test_session_not_consulted_for_tenant_hosts() {
        let decision = decide(
            &facts("acme.kioskfy.com", "/dashboard"),
            &RouteTables::default(),
            &config(),
            || -> std::future::Ready<SessionLookup> { panic!("session lookup must not run for tenant rewrites") },
        )
        .await;
        assert!(matches!(decision, EdgeDecision::Rewrite { .. }));
    }

    #[tokio::test]
    async fn test_shared_auth_on_tenant_host_skips_gate() {
        for host in ["labo.kioskfy.com", "admin.kioskfy.com", "acme.kioskfy.com"] {
            for path in ["/login", "/register", "/forgot-password", "/login?redirect=%2Fdashboard"] {
                let decision = decide(
                    &facts(host, path),
                    &RouteTables::default(),
                    &config(),
                    || -> std::future::Ready<SessionLookup> { panic!("session lookup must not run on tenant hosts") },
                )
                .await;
                assert_eq!(decision, EdgeDecision::PassThrough, "{}{}", host, path);
            }
        }
    }

    #[tokio::test]
    async fn test_gate_outcomes_on_root_host() {
        assert_eq!(
            run(&facts("kioskfy.com", "/dashboard"), SessionLookup::Anonymous).await,
            EdgeDecision::Redirect {
                location: "/login?redirect=%2Fdashboard".to_string()
            }
        );
        assert_eq!(
            run(&facts("www.kioskfy.com", "/login"), user(UserType::Client)).await,
            EdgeDecision::Redirect {
                location: "/dashboard".to_string()
            }
        );
        assert_eq!(
            run(&facts("kioskfy.com", "/organization/login?error=1"), user(UserType::Agency)).await,
            EdgeDecision::PassThrough
        );
    }

    #[tokio::test]
    async fn test_rewritten_request_passes_through() {
        let mut f = facts("admin.kioskfy.com", "/admin/foo");
        f.rewritten = true;
        assert_eq!(run(&f, SessionLookup::Anonymous).await, EdgeDecision::PassThrough);
    }

    /// Feed every outcome back into the pipeline until it settles. A rewrite
    /// is re-fed as the internal request it produced; a redirect as the
    /// browser's follow-up request on the same host.
    async fn settle(host: &str, path: &str, session: &SessionLookup) -> Vec<EdgeDecision> {
        let mut current = facts(host, path);
        let mut trail = Vec::new();

        for _ in 0..4 {
            let decision = run(&current, session.clone()).await;
            trail.push(decision.clone());
            match decision {
                EdgeDecision::PassThrough => return trail,
                EdgeDecision::Rewrite { path, .. } => {
                    let query = current.query.clone();
                    let path_and_query = match query {
                        Some(q) => format!("{}?{}", path, q),
                        None => path,
                    };
                    current = facts(host, &path_and_query);
                    current.rewritten = true;
                }
                EdgeDecision::Redirect { location } => {
                    current = facts(host, &location);
                }
            }
        }
        panic!("no convergence for {}{}: {:?}", host, path, trail);
    }

    #[tokio::test]
    async fn test_decisions_converge_to_pass_through() {
        let sessions = [
            SessionLookup::Anonymous,
            SessionLookup::LookupFailed("down".to_string()),
            user(UserType::Client),
            user(UserType::Agency),
            user(UserType::None),
        ];
        let hosts = ["kioskfy.com", "www.kioskfy.com", "admin.kioskfy.com", "labo.kioskfy.com", "acme.kioskfy.com"];
        let paths = [
            "/",
            "/foo",
            "/login",
            "/register",
            "/forgot-password",
            "/dashboard",
            "/admin",
            "/organization/login",
            "/organization/subscription",
            "/organization/dashboard",
        ];

        for session in &sessions {
            for host in hosts {
                for path in paths {
                    let trail = settle(host, path, session).await;
                    let rewrites = trail
                        .iter()
                        .filter(|d| matches!(d, EdgeDecision::Rewrite { .. }))
                        .count();
                    assert!(rewrites <= 1, "double rewrite for {}{}: {:?}", host, path, trail);
                }
            }
        }
    }

    /// Follow every outcome to where it settles: (path the browser shows, path the origin serves)
    async fn destination(host: &str, path: &str, session: &SessionLookup) -> (String, String) {
        let mut browser = path.to_string();
        let mut origin = path.to_string();

        for decision in settle(host, path, session).await {
            match decision {
                EdgeDecision::Redirect { location } => {
                    browser = location.clone();
                    origin = location;
                }
                EdgeDecision::Rewrite { path, .. } => origin = path,
                EdgeDecision::PassThrough => {}
            }
        }
        (browser, origin)
    }

    #[tokio::test]
    async fn test_settled_destinations() {
        let anonymous = SessionLookup::Anonymous;
        let failed = SessionLookup::LookupFailed("down".to_string());
        let client = user(UserType::Client);
        let agency = user(UserType::Agency);

        let cases = [
            // Tenant hosts: auth pages stay put, everything else is prefixed once
            ("labo.kioskfy.com", "/login", &agency, "/login", "/login"),
            ("labo.kioskfy.com", "/login", &client, "/login", "/login"),
            ("labo.kioskfy.com", "/register", &agency, "/register", "/register"),
            ("labo.kioskfy.com", "/", &agency, "/", "/organization/"),
            ("labo.kioskfy.com", "/dashboard", &anonymous, "/dashboard", "/organization/dashboard"),
            ("admin.kioskfy.com", "/login", &client, "/login", "/login"),
            ("admin.kioskfy.com", "/register", &agency, "/register", "/register"),
            ("admin.kioskfy.com", "/forgot-password", &anonymous, "/forgot-password", "/forgot-password"),
            ("admin.kioskfy.com", "/users", &anonymous, "/users", "/admin/users"),
            ("acme.kioskfy.com", "/login", &client, "/login", "/login"),
            // Root hosts: the gate decides
            ("kioskfy.com", "/login", &client, "/dashboard", "/dashboard"),
            ("kioskfy.com", "/login", &agency, "/organization/dashboard", "/organization/dashboard"),
            ("kioskfy.com", "/register", &agency, "/organization/dashboard", "/organization/dashboard"),
            ("kioskfy.com", "/organization/subscription", &client, "/dashboard", "/dashboard"),
            ("kioskfy.com", "/organization/login", &anonymous, "/organization/login", "/organization/login"),
            ("kioskfy.com", "/organization/login?error=1", &agency, "/organization/login?error=1", "/organization/login?error=1"),
            ("www.kioskfy.com", "/login", &client, "/dashboard", "/dashboard"),
            ("kioskfy.com", "/dashboard", &anonymous, "/login?redirect=%2Fdashboard", "/login?redirect=%2Fdashboard"),
            (
                "kioskfy.com",
                "/organization/dashboard",
                &failed,
                "/login?redirect=%2Forganization%2Fdashboard",
                "/login?redirect=%2Forganization%2Fdashboard",
            ),
        ];

        for (host, path, session, browser, origin) in cases {
            assert_eq!(
                destination(host, path, session).await,
                (browser.to_string(), origin.to_string()),
                "{}{} as {}",
                host,
                path,
                session.label()
            );
        }
    }
}
