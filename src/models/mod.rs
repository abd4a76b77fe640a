//! # Data Models
//!
//! SeaORM entities for the outage store and the response types served by the
//! Greenergy API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod available_period;
pub mod market_document;
pub mod point;
pub mod time_series;
pub mod unavailability;

pub use available_period::Entity as AvailablePeriod;
pub use market_document::Entity as MarketDocument;
pub use point::Entity as Point;
pub use time_series::Entity as TimeSeries;
pub use unavailability::{
    UnavailabilityFilter, UnavailabilityItem, UnavailabilityResponse, UnavailabilityStats,
};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "greenergy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
