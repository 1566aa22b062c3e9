// Entry point for a single watcher run (schedule it externally)

use anyhow::{Context, Result};
use sale_watch::{Config, SaleWatch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sale_watch=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    let watch = SaleWatch::from_config(config).context("Failed to build HTTP clients")?;
    watch
        .run_once(chrono::Utc::now())
        .await
        .context("Sale watch run failed")?;

    Ok(())
}
