//! Loads every `*.xml` unavailability document from a directory into the
//! outage store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use greenergy::{
    config::ConfigLoader,
    db,
    ingest::{SeedOptions, seed_outages},
    migration::{Migrator, MigratorTrait},
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "seed_outages", about = "Seed generation outages from ENTSO-E XML files")]
struct Args {
    /// Directory containing the XML files (defaults to GREENERGY_SEED_DIR)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Keep existing outage data instead of clearing it first
    #[arg(long)]
    keep_existing: bool,

    /// Do not apply pending migrations before seeding
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    init_tracing(&config).context("initializing tracing")?;

    let dir = args.dir.unwrap_or_else(|| config.seed_dir.clone());

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    if !args.no_migrate {
        Migrator::up(&db, None)
            .await
            .context("applying database migrations")?;
    }

    let started = Instant::now();
    let summary = seed_outages(
        Arc::new(db),
        &dir,
        SeedOptions {
            clear_existing: !args.keep_existing,
        },
    )
    .await
    .with_context(|| format!("seeding outages from {}", dir.display()))?;

    println!(
        "Seeded {} of {} file(s) from {} in {:.1}s: {} time series, {} periods, {} points",
        summary.files_ingested,
        summary.files_seen,
        dir.display(),
        started.elapsed().as_secs_f64(),
        summary.records.time_series_created,
        summary.records.periods_created,
        summary.records.points_created,
    );
    for (path, reason) in &summary.files_skipped {
        println!("  skipped {}: {}", path.display(), reason);
    }

    Ok(())
}
