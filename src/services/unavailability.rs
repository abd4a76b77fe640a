//! Aggregation service for unavailability queries.
//!
//! Every view (list, grouped list, stats, exports) is built from the same
//! records and the same capacity rule, so totals always match the items a
//! caller sees.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::capacity::{CapacityResult, calculate_capacity, total_unavailable};
use crate::error::RepositoryError;
use crate::grouping::{GroupingIdentity, deduplicate};
use crate::models::{
    UnavailabilityFilter, UnavailabilityItem, UnavailabilityResponse, UnavailabilityStats,
};
use crate::repositories::TimeSeriesRecord;

/// Read access to stored time series.
#[async_trait]
pub trait UnavailabilityStore: Send + Sync {
    /// Time series matching `filter`, each with its periods and points.
    async fn find_time_series(
        &self,
        filter: &UnavailabilityFilter,
    ) -> Result<Vec<TimeSeriesRecord>, RepositoryError>;
}

/// Builds unavailability responses from a store.
#[derive(Clone)]
pub struct UnavailabilityService {
    store: Arc<dyn UnavailabilityStore>,
}

impl UnavailabilityService {
    pub fn new(store: Arc<dyn UnavailabilityStore>) -> Self {
        Self { store }
    }

    /// All matching items in ascending start time, with stats over the same items.
    pub async fn list(
        &self,
        filter: &UnavailabilityFilter,
    ) -> Result<UnavailabilityResponse, RepositoryError> {
        let items = self.items(filter).await?;
        Ok(respond(items))
    }

    /// Like [`Self::list`] with redundant records collapsed first.
    pub async fn list_grouped(
        &self,
        filter: &UnavailabilityFilter,
    ) -> Result<UnavailabilityResponse, RepositoryError> {
        let items = deduplicate(self.items(filter).await?);
        Ok(respond(items))
    }

    /// Total unavailable capacity over the raw or grouped set.
    pub async fn stats(
        &self,
        filter: &UnavailabilityFilter,
        use_grouped: bool,
    ) -> Result<UnavailabilityStats, RepositoryError> {
        let response = if use_grouped {
            self.list_grouped(filter).await?
        } else {
            self.list(filter).await?
        };
        Ok(response.stats)
    }

    /// Dispatch to [`Self::list`] or [`Self::list_grouped`].
    pub async fn query(
        &self,
        filter: &UnavailabilityFilter,
        use_grouped: bool,
    ) -> Result<UnavailabilityResponse, RepositoryError> {
        if use_grouped {
            self.list_grouped(filter).await
        } else {
            self.list(filter).await
        }
    }

    async fn items(
        &self,
        filter: &UnavailabilityFilter,
    ) -> Result<Vec<UnavailabilityItem>, RepositoryError> {
        let records = self.store.find_time_series(filter).await?;

        let mut items: Vec<UnavailabilityItem> = records.iter().map(to_item).collect();
        // Stable, so store order is kept among equal start times.
        items.sort_by_key(|item| item.start_time);

        tracing::debug!(count = items.len(), "loaded unavailability items");
        Ok(items)
    }
}

fn respond(items: Vec<UnavailabilityItem>) -> UnavailabilityResponse {
    let stats = UnavailabilityStats {
        total_unavailable_capacity: total_unavailable(items.iter().map(capacity_of)),
    };
    UnavailabilityResponse {
        total: items.len(),
        stats,
        items,
    }
}

/// Map one stored record to its response item, computing capacity.
pub fn to_item(record: &TimeSeriesRecord) -> UnavailabilityItem {
    let series = &record.series;
    let nominal_power = series.nominal_power_value();
    let capacity = calculate_capacity(nominal_power, record.quantities());

    UnavailabilityItem {
        id: series.id,
        resource_name: series.resource_name.clone(),
        resource_location: series.resource_location.clone(),
        resource_type: series.resource_type.clone(),
        start_time: series.start_time.with_timezone(&Utc),
        end_time: series.end_time.with_timezone(&Utc),
        nominal_power,
        available_capacity: Some(capacity.available_capacity),
        unavailable_capacity: Some(capacity.unavailable_capacity),
        business_type: series.business_type.clone(),
        reason_code: record.reason_code.clone(),
    }
}

fn capacity_of(item: &UnavailabilityItem) -> CapacityResult {
    CapacityResult {
        available_capacity: item.available_capacity.unwrap_or_default(),
        unavailable_capacity: item.unavailable_capacity.unwrap_or_default(),
    }
}

impl GroupingIdentity for UnavailabilityItem {
    fn resource_location(&self) -> Option<&str> {
        self.resource_location.as_deref()
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    fn nominal_power(&self) -> Option<f64> {
        self.nominal_power
    }
}
