//! meeseeqls Agent Binary
//!
//! Entry point for the meeseeqls polling agent.
//!
//! # Usage
//!
//! ```bash
//! meeseeqls --config ./meeseeqls.json
//! meeseeqls check
//! meeseeqls --version
//! ```

#![deny(unsafe_code)]

use agent::AgentSettings;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// meeseeqls - records how long configured database queries take
#[derive(Parser)]
#[command(name = "meeseeqls")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the JSON configuration file
    #[arg(short, long, env = "MEESEEQLS_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the configured connectors until interrupted (default)
    Run,
    /// Validate the configuration and print the polling plan
    Check,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut settings = AgentSettings::from_env()?;
    if let Some(path) = cli.config {
        settings.config_path = path;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => agent::run_agent_with_settings(settings).await,
        Commands::Check => {
            let config = agent::load_config(&settings)?;
            println!("Configuration {} is valid", settings.config_path.display());
            println!("Output: {}", config.output.path.display());
            for line in agent::describe_plan(&config) {
                println!("  {line}");
            }
            Ok(())
        }
    }
}
