//! # Greenergy API Main Entry Point
//!
//! Loads configuration, connects to the database, applies migrations and
//! serves the HTTP API.

use anyhow::Context;
use greenergy::{
    config::ConfigLoader,
    db::init_pool,
    migration::{Migrator, MigratorTrait},
    server::run_server,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "effective configuration");
    }

    let db = init_pool(&config).await?;

    if config.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("failed to apply database migrations")?;
        tracing::info!("database migrations applied");
    }

    run_server(config, db).await
}
