//! Database migrations for the Greenergy outage store.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_market_documents;
mod m2025_01_10_000002_create_time_series;
mod m2025_01_10_000003_create_available_periods;
mod m2025_01_10_000004_create_points;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_market_documents::Migration),
            Box::new(m2025_01_10_000002_create_time_series::Migration),
            Box::new(m2025_01_10_000003_create_available_periods::Migration),
            Box::new(m2025_01_10_000004_create_points::Migration),
        ]
    }
}
