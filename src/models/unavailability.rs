//! Unavailability query filter and response types.
//!
//! These are produced by the aggregation service and consumed unchanged by the
//! HTTP handlers and the CSV/XLSX exporters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Filter applied to every unavailability read.
///
/// Name and location match case-insensitively as substrings; the interval
/// bounds are inclusive (`start_time >= start_date`, `end_time <= end_date`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_location: Option<String>,
}

impl UnavailabilityFilter {
    /// Returns the name needle, ignoring blank input.
    pub fn resource_name_needle(&self) -> Option<&str> {
        non_blank(self.resource_name.as_deref())
    }

    /// Returns the location needle, ignoring blank input.
    pub fn resource_location_needle(&self) -> Option<&str> {
        non_blank(self.resource_location.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One outage record as returned to API clients and exporters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityItem {
    /// Time series identifier
    pub id: Uuid,
    /// Registered resource name
    #[schema(example = "PAKS 2")]
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_location: Option<String>,
    /// PSR type code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "B14")]
    pub resource_type: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Nominal power in MAW
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_power: Option<f64>,
    /// Highest available capacity across all points, in MAW
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_capacity: Option<f64>,
    /// Nominal power minus available capacity, in MAW
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable_capacity: Option<f64>,
    /// Business type (A53, A54, ...)
    #[schema(example = "A53")]
    pub business_type: String,
    /// Reason code of the owning document (B18, B19, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
}

/// Aggregate statistics over a result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityStats {
    /// Total unavailable capacity in MAW
    pub total_unavailable_capacity: f64,
}

/// List response with items, statistics and item count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityResponse {
    pub items: Vec<UnavailabilityItem>,
    pub stats: UnavailabilityStats,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blank_needles_are_ignored() {
        let filter = UnavailabilityFilter {
            resource_name: Some("   ".to_string()),
            resource_location: Some(" Paks ".to_string()),
            ..Default::default()
        };

        assert_eq!(filter.resource_name_needle(), None);
        assert_eq!(filter.resource_location_needle(), Some("Paks"));
    }

    #[test]
    fn item_serializes_camel_case_and_skips_absent_fields() {
        let item = UnavailabilityItem {
            id: Uuid::nil(),
            resource_name: "Unit 1".to_string(),
            resource_location: None,
            resource_type: Some("B16".to_string()),
            start_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            nominal_power: Some(200.0),
            available_capacity: Some(50.0),
            unavailable_capacity: Some(150.0),
            business_type: "A53".to_string(),
            reason_code: None,
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["resourceName"], "Unit 1");
        assert_eq!(value["unavailableCapacity"], 150.0);
        assert_eq!(value["startTime"], "2025-01-01T00:00:00Z");
        assert!(value.get("resourceLocation").is_none());
        assert!(value.get("reasonCode").is_none());
    }
}
