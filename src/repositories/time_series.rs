//! # TimeSeries Repository
//!
//! Writes time series during ingestion and reads them back, with their
//! available periods and points, for the aggregation service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::UnavailabilityFilter;
use crate::models::available_period::{self, Entity as AvailablePeriod};
use crate::models::market_document::Entity as MarketDocument;
use crate::models::point::{self, Entity as Point};
use crate::models::time_series::{self, Entity as TimeSeries};
use crate::services::UnavailabilityStore;

// Keeps `IN (...)` lists under backend bind-parameter limits.
const ID_CHUNK: usize = 500;

/// Field values of a time series as written by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTimeSeries {
    pub market_document_id: Uuid,
    pub m_rid: String,
    pub business_type: String,
    pub bidding_zone: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub quantity_unit: String,
    pub curve_type: Option<String>,
    pub resource_m_rid: String,
    pub resource_name: String,
    pub resource_location: Option<String>,
    pub resource_type: Option<String>,
    pub power_system_m_rid: Option<String>,
    pub power_system_name: Option<String>,
    /// `Some(NaN)` when the source value was present but malformed
    pub nominal_power: Option<f64>,
    pub nominal_power_unit: String,
}

/// A time series read back with everything capacity depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    pub series: time_series::Model,
    /// Reason code of the owning market document
    pub reason_code: Option<String>,
    pub periods: Vec<PeriodRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRecord {
    pub period: available_period::Model,
    pub points: Vec<point::Model>,
}

impl TimeSeriesRecord {
    /// Every point quantity across every period, in storage order.
    pub fn quantities(&self) -> impl Iterator<Item = f64> + '_ {
        self.periods
            .iter()
            .flat_map(|period| period.points.iter().map(|point| point.quantity_value()))
    }
}

/// Repository for time series database operations
#[derive(Debug, Clone)]
pub struct TimeSeriesRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl TimeSeriesRepository {
    /// Creates a new TimeSeriesRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a time series under an existing market document
    ///
    /// # Arguments
    ///
    /// * `series` - Field values of the new series
    ///
    /// # Returns
    ///
    /// Returns the created model with its generated id
    pub async fn create(&self, series: &NewTimeSeries) -> Result<time_series::Model, DbErr> {
        let active = time_series::ActiveModel {
            id: Set(Uuid::new_v4()),
            market_document_id: Set(series.market_document_id),
            m_rid: Set(series.m_rid.clone()),
            business_type: Set(series.business_type.clone()),
            bidding_zone: Set(series.bidding_zone.clone()),
            start_time: Set(series.start_time.fixed_offset()),
            end_time: Set(series.end_time.fixed_offset()),
            quantity_unit: Set(series.quantity_unit.clone()),
            curve_type: Set(series.curve_type.clone()),
            resource_m_rid: Set(series.resource_m_rid.clone()),
            resource_name: Set(series.resource_name.clone()),
            resource_location: Set(series.resource_location.clone()),
            resource_type: Set(series.resource_type.clone()),
            power_system_m_rid: Set(series.power_system_m_rid.clone()),
            power_system_name: Set(series.power_system_name.clone()),
            nominal_power: Set(series.nominal_power.filter(|value| !value.is_nan())),
            nominal_power_malformed: Set(series.nominal_power.is_some_and(f64::is_nan)),
            nominal_power_unit: Set(series.nominal_power_unit.clone()),
        };

        active.insert(&*self.db).await
    }

    /// Counts stored time series
    pub async fn count(&self) -> Result<u64, DbErr> {
        TimeSeries::find().count(&*self.db).await
    }

    /// Finds time series matching the filter, ordered by ascending start time
    ///
    /// Each record carries the owning document's reason code and all of its
    /// available periods and points.
    ///
    /// # Arguments
    ///
    /// * `filter` - Date range and case-insensitive name/location filter
    ///
    /// # Returns
    ///
    /// Returns the matching records, or the underlying database error
    pub async fn find_with_periods(
        &self,
        filter: &UnavailabilityFilter,
    ) -> Result<Vec<TimeSeriesRecord>, RepositoryError> {
        let rows = TimeSeries::find()
            .find_also_related(MarketDocument)
            .filter(filter_condition(filter))
            .order_by_asc(time_series::Column::StartTime)
            .all(&*self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let series_ids: Vec<Uuid> = rows.iter().map(|(series, _)| series.id).collect();
        let mut periods_by_series = self.load_periods(&series_ids).await?;

        let records = rows
            .into_iter()
            .map(|(series, document)| TimeSeriesRecord {
                reason_code: document.and_then(|doc| doc.reason_code),
                periods: periods_by_series.remove(&series.id).unwrap_or_default(),
                series,
            })
            .collect();

        Ok(records)
    }

    async fn load_periods(
        &self,
        series_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<PeriodRecord>>, RepositoryError> {
        let mut periods = Vec::new();
        for chunk in series_ids.chunks(ID_CHUNK) {
            let batch = AvailablePeriod::find()
                .filter(available_period::Column::TimeSeriesId.is_in(chunk.iter().copied()))
                .order_by_asc(available_period::Column::StartTime)
                .all(&*self.db)
                .await
                .map_err(RepositoryError::database_error)?;
            periods.extend(batch);
        }

        let period_ids: Vec<Uuid> = periods.iter().map(|period| period.id).collect();
        let mut points_by_period: HashMap<Uuid, Vec<point::Model>> = HashMap::new();
        for chunk in period_ids.chunks(ID_CHUNK) {
            let batch = Point::find()
                .filter(point::Column::AvailablePeriodId.is_in(chunk.iter().copied()))
                .order_by_asc(point::Column::Position)
                .all(&*self.db)
                .await
                .map_err(RepositoryError::database_error)?;
            for point in batch {
                points_by_period
                    .entry(point.available_period_id)
                    .or_default()
                    .push(point);
            }
        }

        let mut by_series: HashMap<Uuid, Vec<PeriodRecord>> = HashMap::new();
        for period in periods {
            let points = points_by_period.remove(&period.id).unwrap_or_default();
            by_series
                .entry(period.time_series_id)
                .or_default()
                .push(PeriodRecord { period, points });
        }

        Ok(by_series)
    }
}

#[async_trait]
impl UnavailabilityStore for TimeSeriesRepository {
    async fn find_time_series(
        &self,
        filter: &UnavailabilityFilter,
    ) -> Result<Vec<TimeSeriesRecord>, RepositoryError> {
        self.find_with_periods(filter).await
    }
}

fn filter_condition(filter: &UnavailabilityFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(start) = filter.start_date {
        condition = condition.add(time_series::Column::StartTime.gte(start.fixed_offset()));
    }
    if let Some(end) = filter.end_date {
        condition = condition.add(time_series::Column::EndTime.lte(end.fixed_offset()));
    }
    if let Some(name) = filter.resource_name_needle() {
        condition = condition.add(contains_insensitive(time_series::Column::ResourceName, name));
    }
    if let Some(location) = filter.resource_location_needle() {
        condition = condition.add(contains_insensitive(
            time_series::Column::ResourceLocation,
            location,
        ));
    }

    condition
}

/// `LOWER(time_series.<column>) LIKE '%needle%'`, with LIKE wildcards in the needle escaped.
fn contains_insensitive(column: time_series::Column, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    Expr::expr(Func::lower(Expr::col((TimeSeries, column))))
        .like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}
