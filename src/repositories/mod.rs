//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for the outage tables: market documents, time series, available periods and points.

pub mod available_period;
pub mod market_document;
pub mod point;
pub mod time_series;

pub use available_period::{AvailablePeriodRepository, NewAvailablePeriod};
pub use market_document::{MarketDocumentRepository, NewMarketDocument};
pub use point::{NewPoint, PointRepository};
pub use time_series::{NewTimeSeries, PeriodRecord, TimeSeriesRecord, TimeSeriesRepository};
