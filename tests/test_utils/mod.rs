//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations applied, and for staging XML fixtures in temporary
//! directories.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Raw unavailable capacity across `outage_paks.xml` and `outage_gravelines.xml`.
#[allow(dead_code)]
pub const RAW_TOTAL: f64 = 1860.0;

/// Grouped unavailable capacity across the same two fixtures.
#[allow(dead_code)]
pub const GROUPED_TOTAL: f64 = 1560.0;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// # Returns
///
/// Returns a Result containing the database connection
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up an in-memory SQLite database with all migrations applied and returns an Arc.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(db))
}

/// Directory holding the XML fixtures.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Copies the named fixtures into a fresh temporary directory.
pub fn stage_fixtures(names: &[&str]) -> Result<TempDir> {
    let dir = TempDir::new()?;
    for name in names {
        std::fs::copy(fixtures_dir().join(name), dir.path().join(name))?;
    }
    Ok(dir)
}
