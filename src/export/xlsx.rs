//! XLSX rendering.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::{COLUMNS, ExportError, TOTAL_CAPACITY_LABEL, TOTAL_RECORDS_LABEL};
use crate::models::{UnavailabilityItem, UnavailabilityResponse};

pub const SHEET_NAME: &str = "Unavailabilities";
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Column widths in characters, aligned with [`COLUMNS`].
const COLUMN_WIDTHS: [f64; 10] = [30.0, 20.0, 15.0, 20.0, 20.0, 18.0, 22.0, 24.0, 15.0, 15.0];

/// Render the response as a single-sheet workbook.
///
/// Start and end times are real date cells. One blank row separates the
/// items from the summary rows.
pub fn render_xlsx(response: &UnavailabilityResponse) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_FORMAT);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in COLUMNS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, width)?;
    }

    let mut row: u32 = 1;
    for item in &response.items {
        write_item(sheet, row, item, &date)?;
        row += 1;
    }

    // Blank separator row.
    row += 1;
    sheet.write_string_with_format(row, 0, TOTAL_CAPACITY_LABEL, &header)?;
    write_optional_number(sheet, row, 1, Some(response.stats.total_unavailable_capacity))?;
    row += 1;
    sheet.write_string_with_format(row, 0, TOTAL_RECORDS_LABEL, &header)?;
    sheet.write_number(row, 1, response.items.len() as f64)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_item(
    sheet: &mut Worksheet,
    row: u32,
    item: &UnavailabilityItem,
    date: &Format,
) -> Result<(), XlsxError> {
    sheet.write_string(row, 0, &item.resource_name)?;
    write_optional_string(sheet, row, 1, item.resource_location.as_deref())?;
    write_optional_string(sheet, row, 2, item.resource_type.as_deref())?;
    sheet.write_datetime_with_format(row, 3, &item.start_time.naive_utc(), date)?;
    sheet.write_datetime_with_format(row, 4, &item.end_time.naive_utc(), date)?;
    write_optional_number(sheet, row, 5, item.nominal_power)?;
    write_optional_number(sheet, row, 6, item.available_capacity)?;
    write_optional_number(sheet, row, 7, item.unavailable_capacity)?;
    sheet.write_string(row, 8, &item.business_type)?;
    write_optional_string(sheet, row, 9, item.reason_code.as_deref())?;
    Ok(())
}

fn write_optional_string(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
) -> Result<(), XlsxError> {
    if let Some(value) = value {
        sheet.write_string(row, col, value)?;
    }
    Ok(())
}

// Spreadsheet cells cannot hold NaN or infinities; those stay empty.
fn write_optional_number(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
) -> Result<(), XlsxError> {
    if let Some(value) = value.filter(|v| v.is_finite()) {
        sheet.write_number(row, col, value)?;
    }
    Ok(())
}
