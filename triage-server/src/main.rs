//! Exception triage server binary

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_server::{config::Config, server::run_server, Result};

/// Exception triage intake server
#[derive(Parser)]
#[command(name = "exception-triage")]
#[command(about = "Deduplicates exception reports against an issue tracker")]
#[command(version)]
struct Cli {
    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Override server port
    #[arg(long)]
    port: Option<u16>,

    /// Path to configuration file
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from_file(path),
        None => Config::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    apply_cli_overrides(&mut config, &cli);
    init_tracing(&config);

    info!("Configuration loaded successfully");
    info!(
        "Triaging reports for project {} ({})",
        config.triage.project_key, config.triage.issue_type
    );

    if let Err(e) = run_server(config).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter().into());

    let (json, text) = if config.logging.format.eq_ignore_ascii_case("json") {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
}
