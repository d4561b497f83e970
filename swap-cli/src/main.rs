use anyhow::Context;
use clap::Parser;
use swap_cli::{init_tracing, Cli};
use swap_client::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_with(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(token) = &cli.token {
        config.api.access_token = Some(token.clone());
    }

    init_tracing(&config.logging.level);
    tracing::debug!("Using backend {}", config.api.base_url);

    swap_cli::run(cli.command, config).await
}
