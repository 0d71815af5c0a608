use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_session_token, Claims};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::session::UserType;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id (a random one is generated when omitted)")]
    pub user_id: Option<String>,

    #[arg(long, help = "User type: client, agency or none")]
    pub user_type: UserType,

    #[arg(long, help = "Lifetime in hours (defaults to the configured TTL)")]
    pub ttl_hours: Option<u64>,
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let user_id = args.user_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let ttl_hours = args.ttl_hours.unwrap_or(config.session.token_ttl_hours);

    let claims = Claims::new(user_id.clone(), args.user_type, ttl_hours);
    let token = generate_session_token(&claims, &config.session.jwt_secret)?;

    output_success(
        &output_format,
        &format!("Session token for {} ({:?})", user_id, args.user_type),
        Some(json!({
            "token": token,
            "cookie": format!("{}={}", config.session.cookie_name, token),
            "expires_at": claims.exp,
        })),
    )
}
