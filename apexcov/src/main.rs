mod config;

use agent_api::AppState;
use clap::Parser;
use config::Config;
use relay::{RelayClient, RelayConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, default_value = "apexcov.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Relay(#[from] relay::RelayError),
    #[error(transparent)]
    Serve(#[from] agent_api::ServeError),
}

async fn run(cli: Cli) -> Result<(), RunError> {
    let config = Config::from_file(&cli.config)?;

    let relay_config = match config.relay {
        Some(relay) => relay,
        None => RelayConfig::from_env()?,
    };
    // A bad relay config should kill the process here, not surface on the
    // first dashboard request.
    let client = RelayClient::new(relay_config)?;

    let state = AppState::new(client, config.agents, config.statuses);
    agent_api::serve(&config.listener.host, config.listener.port, state).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!("apexcov failed to start: {err}");
        std::process::exit(1);
    }
}
