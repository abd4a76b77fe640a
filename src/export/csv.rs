//! CSV rendering.

use ::csv::WriterBuilder;
use chrono::{DateTime, SecondsFormat, Utc};

use super::{COLUMNS, ExportError, TOTAL_CAPACITY_LABEL, TOTAL_RECORDS_LABEL};
use crate::models::{UnavailabilityItem, UnavailabilityResponse};

/// Render the response as CSV: header, one row per item, a blank line, then
/// the summary rows.
pub fn render_csv(response: &UnavailabilityResponse) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for item in &response.items {
        writer.write_record(item_record(item))?;
    }

    let mut buffer = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    buffer.push(b'\n');

    let mut summary = WriterBuilder::new().from_writer(buffer);
    summary.write_record([
        TOTAL_CAPACITY_LABEL.to_string(),
        response.stats.total_unavailable_capacity.to_string(),
    ])?;
    summary.write_record([
        TOTAL_RECORDS_LABEL.to_string(),
        response.items.len().to_string(),
    ])?;

    summary
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

fn item_record(item: &UnavailabilityItem) -> [String; 10] {
    [
        item.resource_name.clone(),
        item.resource_location.clone().unwrap_or_default(),
        item.resource_type.clone().unwrap_or_default(),
        instant(item.start_time),
        instant(item.end_time),
        number(item.nominal_power),
        number(item.available_capacity),
        number(item.unavailable_capacity),
        item.business_type.clone(),
        item.reason_code.clone().unwrap_or_default(),
    ]
}

/// `2025-01-01T00:00:00.000Z`
fn instant(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
