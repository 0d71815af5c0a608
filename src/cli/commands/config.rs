use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let redacted = config.redacted();

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Effective configuration",
            Some(json!({ "config": redacted })),
        ),
        OutputFormat::Text => {
            println!("Environment:      {:?}", redacted.environment);
            println!("Listen port:      {}", redacted.server.port);
            println!("Upstream:         {}", redacted.server.upstream_url);
            println!("Root domain:      {}", redacted.routing.root_domain);
            println!("Preview domain:   {}", redacted.routing.preview_domain());
            println!("Session provider: {:?}", redacted.session.provider);
            println!("Session cookie:   {}", redacted.session.cookie_name);
            println!("JWT secret:       {}", redacted.session.jwt_secret);
            Ok(())
        }
    }
}
