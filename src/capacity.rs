//! Capacity calculation for one time series.
//!
//! This is the only place capacity is derived; list items and aggregate
//! statistics both go through [`calculate_capacity`].

use serde::Serialize;

/// Available and unavailable capacity of one time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityResult {
    pub available_capacity: f64,
    pub unavailable_capacity: f64,
}

impl CapacityResult {
    pub const ZERO: CapacityResult = CapacityResult {
        available_capacity: 0.0,
        unavailable_capacity: 0.0,
    };
}

/// Compute capacity from the nominal power and every point quantity of the series.
///
/// * No nominal power: both values are `0`.
/// * Otherwise `available = max(0, q1..qn)` and `unavailable = nominal - available`,
///   not clamped, so inconsistent data may yield a negative value.
///
/// A `NaN` anywhere (nominal power or a quantity) propagates into the result.
pub fn calculate_capacity<I>(nominal_power: Option<f64>, quantities: I) -> CapacityResult
where
    I: IntoIterator<Item = f64>,
{
    let Some(nominal) = nominal_power else {
        return CapacityResult::ZERO;
    };

    let available = quantities.into_iter().fold(0.0_f64, nan_max);

    CapacityResult {
        available_capacity: available,
        unavailable_capacity: nominal - available,
    }
}

/// Sum of unavailable capacity over a set of results.
pub fn total_unavailable<I>(results: I) -> f64
where
    I: IntoIterator<Item = CapacityResult>,
{
    results
        .into_iter()
        .map(|result| result.unavailable_capacity)
        .sum()
}

// `f64::max` silently drops NaN operands.
fn nan_max(acc: f64, value: f64) -> f64 {
    if acc.is_nan() || value.is_nan() {
        f64::NAN
    } else {
        acc.max(value)
    }
}
