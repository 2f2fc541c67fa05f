use anyhow::{Context, Result};
use siren_storage::Database;
use siren_worker::ReminderConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siren_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("siren-worker starting...");

    let config = ReminderConfig::from_env();
    tracing::info!(interval_secs = config.interval_secs, "Reminder cadence configured");

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Connected to database");

    siren_worker::run(config, db).await?;

    tracing::info!("Worker shutdown complete");
    Ok(())
}
