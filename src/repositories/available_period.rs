//! AvailablePeriod repository for database operations

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::available_period;

/// Field values of an available period as written by ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAvailablePeriod {
    pub time_series_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resolution: Option<String>,
}

/// Repository for available period database operations
#[derive(Debug, Clone)]
pub struct AvailablePeriodRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl AvailablePeriodRepository {
    /// Creates a new AvailablePeriodRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates an available period under an existing time series
    ///
    /// # Arguments
    ///
    /// * `period` - Field values of the new period
    ///
    /// # Returns
    ///
    /// Returns the created model with its generated id
    pub async fn create(
        &self,
        period: &NewAvailablePeriod,
    ) -> Result<available_period::Model, DbErr> {
        available_period::ActiveModel {
            id: Set(Uuid::new_v4()),
            time_series_id: Set(period.time_series_id),
            start_time: Set(period.start_time.fixed_offset()),
            end_time: Set(period.end_time.fixed_offset()),
            resolution: Set(period.resolution.clone()),
        }
        .insert(&*self.db)
        .await
    }
}
