//! De-duplication of time series sharing a location and an exact interval.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};

/// Location used when a record has none.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Identity fields the grouping rule looks at.
pub trait GroupingIdentity {
    fn resource_location(&self) -> Option<&str>;
    fn start_time(&self) -> DateTime<Utc>;
    fn end_time(&self) -> DateTime<Utc>;
    fn nominal_power(&self) -> Option<f64>;
}

/// Key shared by redundant records: `(location or "unknown", start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl GroupKey {
    pub fn of<T: GroupingIdentity>(item: &T) -> Self {
        let location = item
            .resource_location()
            .filter(|location| !location.is_empty())
            .unwrap_or(UNKNOWN_LOCATION)
            .to_string();
        Self {
            location,
            start: item.start_time(),
            end: item.end_time(),
        }
    }
}

/// Nominal power used for ranking; absent or `NaN` ranks as `0`.
fn rank(item: &impl GroupingIdentity) -> f64 {
    match item.nominal_power() {
        Some(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

/// Keep one record per [`GroupKey`]: the one with the highest nominal power.
///
/// Ties keep the earlier record. Groups are emitted in the order their key is
/// first encountered in `items`.
pub fn deduplicate<T: GroupingIdentity>(items: Vec<T>) -> Vec<T> {
    let mut slots: HashMap<GroupKey, usize> = HashMap::with_capacity(items.len());
    let mut winners: Vec<T> = Vec::new();

    for item in items {
        match slots.entry(GroupKey::of(&item)) {
            Entry::Vacant(vacant) => {
                vacant.insert(winners.len());
                winners.push(item);
            }
            Entry::Occupied(occupied) => {
                let current = &mut winners[*occupied.get()];
                if rank(&item) > rank(&*current) {
                    *current = item;
                }
            }
        }
    }

    winners
}
