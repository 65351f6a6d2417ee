// trackfiles - document-backed file storage
// Entry point and logging setup

use clap::Parser;
use trackfiles::app::AppState;
use trackfiles::commands::{self, Cli};
use trackfiles::config::StorageConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackfiles=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting trackfiles");

    let config = StorageConfig::from_env()?;
    let state = AppState::initialize(config).await?;

    let output = commands::run(&state, cli.command).await?;
    println!("{}", output);

    Ok(())
}
