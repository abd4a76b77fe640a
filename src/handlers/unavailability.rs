//! # Unavailability API Handlers
//!
//! List, grouped list, stats and export endpoints. Every handler turns the
//! query string into an [`UnavailabilityFilter`] and delegates to the
//! aggregation service.

use axum::{
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::CallerIdentity;
use crate::error::{ApiError, validation_error};
use crate::export::{self, CSV_CONTENT_TYPE, CSV_FILENAME, XLSX_CONTENT_TYPE, XLSX_FILENAME};
use crate::extract::parse_instant;
use crate::models::{UnavailabilityFilter, UnavailabilityResponse, UnavailabilityStats};
use crate::server::AppState;

/// Query parameters shared by every unavailability endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UnavailabilityQuery {
    /// Only series starting at or after this instant (ISO-8601)
    pub start_date: Option<String>,
    /// Only series ending at or before this instant (ISO-8601)
    pub end_date: Option<String>,
    /// Case-insensitive substring of the resource name
    pub resource_name: Option<String>,
    /// Case-insensitive substring of the resource location
    pub resource_location: Option<String>,
    /// `true` to collapse redundant series; any other value means raw
    pub use_grouped: Option<String>,
}

impl UnavailabilityQuery {
    /// Whether the grouped view was requested. Only the literal `true` counts.
    pub fn use_grouped(&self) -> bool {
        self.use_grouped.as_deref() == Some("true")
    }

    /// Builds the service filter, rejecting unparseable dates.
    pub fn to_filter(&self) -> Result<UnavailabilityFilter, ApiError> {
        Ok(UnavailabilityFilter {
            start_date: parse_date_param("startDate", self.start_date.as_deref())?,
            end_date: parse_date_param("endDate", self.end_date.as_deref())?,
            resource_name: self.resource_name.clone(),
            resource_location: self.resource_location.clone(),
        })
    }
}

fn parse_date_param(
    name: &str,
    value: Option<&str>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, ApiError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    parse_instant(raw).map(Some).ok_or_else(|| {
        validation_error(
            "Invalid query parameters",
            serde_json::json!({ name: format!("'{raw}' is not an ISO-8601 date-time") }),
        )
    })
}

/// List unavailabilities
#[utoipa::path(
    get,
    path = "/api/unavailability",
    params(UnavailabilityQuery),
    responses(
        (status = 200, description = "Matching unavailabilities with stats", body = UnavailabilityResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
    tag = "unavailability"
)]
pub async fn list_unavailabilities(
    State(state): State<AppState>,
    Query(query): Query<UnavailabilityQuery>,
) -> Result<Json<UnavailabilityResponse>, ApiError> {
    let filter = query.to_filter()?;
    let response = state.unavailability.list(&filter).await?;
    Ok(Json(response))
}

/// List unavailabilities with redundant series collapsed
///
/// Series sharing a location and an identical interval are reduced to the
/// one with the highest nominal power.
#[utoipa::path(
    get,
    path = "/api/unavailability/grouped",
    params(UnavailabilityQuery),
    responses(
        (status = 200, description = "Grouped unavailabilities with stats", body = UnavailabilityResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
    tag = "unavailability"
)]
pub async fn list_grouped_unavailabilities(
    State(state): State<AppState>,
    Query(query): Query<UnavailabilityQuery>,
) -> Result<Json<UnavailabilityResponse>, ApiError> {
    let filter = query.to_filter()?;
    let response = state.unavailability.list_grouped(&filter).await?;
    Ok(Json(response))
}

/// Total unavailable capacity
#[utoipa::path(
    get,
    path = "/api/unavailability/stats",
    params(UnavailabilityQuery),
    responses(
        (status = 200, description = "Aggregate statistics", body = UnavailabilityStats),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid credentials", body = ApiError)
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
    tag = "unavailability"
)]
pub async fn unavailability_stats(
    State(state): State<AppState>,
    Query(query): Query<UnavailabilityQuery>,
) -> Result<Json<UnavailabilityStats>, ApiError> {
    let filter = query.to_filter()?;
    let stats = state
        .unavailability
        .stats(&filter, query.use_grouped())
        .await?;
    Ok(Json(stats))
}

/// Download unavailabilities as CSV
#[utoipa::path(
    get,
    path = "/api/unavailability/export/csv",
    params(UnavailabilityQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid credentials", body = ApiError)
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
    tag = "unavailability"
)]
pub async fn export_csv(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<UnavailabilityQuery>,
) -> Result<Response, ApiError> {
    let filter = query.to_filter()?;
    let response = state
        .unavailability
        .query(&filter, query.use_grouped())
        .await?;
    let body = export::render_csv(&response)?;

    tracing::info!(
        subject = %caller.subject,
        rows = response.total,
        grouped = query.use_grouped(),
        "exported CSV"
    );
    Ok(attachment(CSV_CONTENT_TYPE, CSV_FILENAME, body))
}

/// Download unavailabilities as an Excel workbook
#[utoipa::path(
    get,
    path = "/api/unavailability/export/excel",
    params(UnavailabilityQuery),
    responses(
        (status = 200, description = "XLSX attachment",
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            body = Vec<u8>),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid credentials", body = ApiError)
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
    tag = "unavailability"
)]
pub async fn export_excel(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<UnavailabilityQuery>,
) -> Result<Response, ApiError> {
    let filter = query.to_filter()?;
    let response = state
        .unavailability
        .query(&filter, query.use_grouped())
        .await?;
    let body = export::render_xlsx(&response)?;

    tracing::info!(
        subject = %caller.subject,
        rows = response.total,
        grouped = query.use_grouped(),
        "exported workbook"
    );
    Ok(attachment(XLSX_CONTENT_TYPE, XLSX_FILENAME, body))
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}
