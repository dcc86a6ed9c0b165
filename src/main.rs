use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zikhron_client::cli::{self, Cli};
use zikhron_client::config::Config;
use zikhron_client::{ApiClient, FileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env(cli.api_url)?;

    let store = Arc::new(FileStore::new(config.session_path.clone()));
    let client = ApiClient::from_config(&config, store)?;
    tracing::debug!(
        "API client initialized with URL: {} (session file {})",
        config.api_url,
        config.session_path.display()
    );

    cli::run(cli.command, &client).await
}
