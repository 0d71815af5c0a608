use clap::{Args, ValueEnum};
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::routing::{classify_path, decide, resolve_subdomain, EdgeDecision, RequestFacts, RouteTables};
use crate::session::{SessionLookup, SessionUser, UserType};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SimulatedSession {
    /// No session
    None,
    Client,
    Agency,
    /// Signed in without a user type
    Untyped,
    /// Identity service unavailable
    Failed,
}

impl SimulatedSession {
    fn lookup(self) -> SessionLookup {
        let user = |user_type| {
            SessionLookup::Authenticated(SessionUser {
                id: "cli-user".to_string(),
                user_type,
            })
        };

        match self {
            SimulatedSession::None => SessionLookup::Anonymous,
            SimulatedSession::Client => user(UserType::Client),
            SimulatedSession::Agency => user(UserType::Agency),
            SimulatedSession::Untyped => user(UserType::None),
            SimulatedSession::Failed => SessionLookup::LookupFailed("simulated outage".to_string()),
        }
    }
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    #[arg(long, help = "Host header, e.g. acme.kioskfy.com")]
    pub host: String,

    #[arg(long, default_value = "/", help = "Path with optional query string")]
    pub path: String,

    #[arg(long, value_enum, default_value = "none", help = "Session to simulate")]
    pub session: SimulatedSession,

    #[arg(long, help = "Root domain (defaults to the configured one)")]
    pub root_domain: Option<String>,
}

pub async fn handle(args: RouteArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut routing = config.routing.clone();
    if let Some(root) = args.root_domain {
        routing.root_domain = root;
    }
    let tables = RouteTables::default();

    let facts = RequestFacts::new(&routing.default_scheme, Some(&args.host), &args.path);
    let token = resolve_subdomain(&facts.url, facts.host.as_deref(), &routing);
    let class = classify_path(&facts.path, &tables);
    let session = args.session.lookup();
    let session_label = session.label();

    let decision = decide(&facts, &tables, &routing, || futures::future::ready(session)).await;

    let summary = match &decision {
        EdgeDecision::PassThrough => "pass through".to_string(),
        EdgeDecision::Rewrite { path, .. } => format!("rewrite to {}", path),
        EdgeDecision::Redirect { location } => format!("redirect to {}", location),
    };

    output_success(
        &output_format,
        &format!("{}{} → {}", args.host, args.path, summary),
        Some(json!({
            "url": facts.url,
            "token": token,
            "path_class": class,
            "session": session_label,
            "decision": decision,
        })),
    )
}
