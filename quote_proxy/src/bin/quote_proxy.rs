use anyhow::{Context, Result};
use clap::Parser;
use quote_proxy::{cli::Cli, server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quote_proxy=info,quote_ingestor=info,tower_http=info".into()
            }),
        )
        .init();

    let config = Cli::parse()
        .into_config()
        .context("invalid configuration")?;

    server::start(config).await?;
    Ok(())
}
