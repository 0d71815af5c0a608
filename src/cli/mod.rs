pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "kioskfy")]
#[command(about = "Kioskfy edge - inspect tenant routing and manage development sessions")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Explain how the edge would handle a request")]
    Route(commands::route::RouteArgs),

    #[command(about = "Mint a development session token")]
    Token(commands::token::TokenArgs),

    #[command(about = "Show the effective configuration (secrets redacted)")]
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::AppConfig::from_env()?;

    match cli.command {
        Commands::Route(args) => commands::route::handle(args, &config, output_format).await,
        Commands::Token(args) => commands::token::handle(args, &config, output_format),
        Commands::Config => commands::config::handle(&config, output_format),
    }
}
