//! Point repository for database operations

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::point::{self, stored_quantity};

/// Field values of a point as written by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoint {
    pub available_period_id: Uuid,
    pub position: Option<i32>,
    /// `NaN` when the source quantity was malformed
    pub quantity: f64,
}

/// Repository for point database operations
#[derive(Debug, Clone)]
pub struct PointRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl PointRepository {
    /// Creates a new PointRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a point under an existing available period
    pub async fn create(&self, point: &NewPoint) -> Result<point::Model, DbErr> {
        point::ActiveModel {
            id: Set(Uuid::new_v4()),
            available_period_id: Set(point.available_period_id),
            position: Set(point.position),
            quantity: Set(stored_quantity(point.quantity)),
        }
        .insert(&*self.db)
        .await
    }
}
