//! # Exports
//!
//! CSV and XLSX renderings of an
//! [`UnavailabilityResponse`](crate::models::UnavailabilityResponse). Both formats share
//! the column layout and the two trailing summary rows.

use thiserror::Error;

pub mod csv;
pub mod xlsx;

pub use self::csv::render_csv;
pub use self::xlsx::render_xlsx;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const CSV_FILENAME: &str = "unavailabilities.csv";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLSX_FILENAME: &str = "unavailabilities.xlsx";

pub const COLUMNS: [&str; 10] = [
    "Resource Name",
    "Location",
    "Type",
    "Start Time",
    "End Time",
    "Nominal Power (MW)",
    "Available Capacity (MW)",
    "Unavailable Capacity (MW)",
    "Business Type",
    "Reason Code",
];

pub const TOTAL_CAPACITY_LABEL: &str = "Total Unavailable Capacity (MAW)";
pub const TOTAL_RECORDS_LABEL: &str = "Total Records";

/// Errors raised while rendering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("export buffer error: {0}")]
    Io(#[from] std::io::Error),
    #[error("workbook encoding failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl From<ExportError> for crate::error::ApiError {
    fn from(error: ExportError) -> Self {
        tracing::error!(error = %error, "export rendering failed");
        crate::error::ApiError::new(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "EXPORT_FAILED",
            "Failed to render export",
        )
    }
}
