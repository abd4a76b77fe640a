//! Extraction of `Unavailability_MarketDocument` files into a normalized tree.
//!
//! The extractor only reads; it never decides whether a time series is kept.
//! Interval fallback and record skipping belong to the mapper in
//! [`crate::ingest`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::IngestError;
use crate::xml::{self, XmlElement};

pub const ROOT_ELEMENT: &str = "Unavailability_MarketDocument";
pub const DEFAULT_UNIT: &str = "MAW";

const VALIDITY_PARENT: &str = "unavailability_Time_Period";
const VALIDITY_CHILD: &str = "timeInterval";

/// A coded identifier: either a bare value or a value qualified by a coding scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodedValue {
    Scalar(String),
    Coded { scheme: String, text: String },
}

impl CodedValue {
    pub fn from_element(element: &XmlElement) -> Self {
        let text = element.text().unwrap_or_default().to_string();
        match element.attribute("codingScheme") {
            Some(scheme) if !scheme.trim().is_empty() => CodedValue::Coded {
                scheme: scheme.trim().to_string(),
                text,
            },
            _ => CodedValue::Scalar(text),
        }
    }

    /// Collapse to the stored string form, `<scheme>:<text>` for coded values.
    pub fn normalize(&self) -> String {
        match self {
            CodedValue::Scalar(text) => text.clone(),
            CodedValue::Coded { scheme, text } => format!("{scheme}:{text}"),
        }
    }
}

/// Closed validity interval of a market document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Rated capacity with its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct NominalPower {
    /// `NaN` when the source text is not a number.
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub m_rid: String,
    pub revision_number: i32,
    pub doc_type: String,
    pub process_type: Option<String>,
    pub created_date_time: DateTime<Utc>,
    pub validity: TimeInterval,
    pub reason_code: Option<String>,
    pub time_series: Vec<ExtractedTimeSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTimeSeries {
    pub m_rid: String,
    pub business_type: String,
    pub bidding_zone: String,
    /// Combined from the separate date and time fields; `None` unless both parse.
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub quantity_unit: String,
    pub curve_type: Option<String>,
    pub resource_m_rid: String,
    pub resource_name: String,
    pub resource_location: Option<String>,
    pub resource_type: Option<String>,
    pub power_system_m_rid: Option<String>,
    pub power_system_name: Option<String>,
    pub nominal_power: Option<NominalPower>,
    pub periods: Vec<ExtractedPeriod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPeriod {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub points: Vec<ExtractedPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPoint {
    /// `None` when the position is not an integer.
    pub position: Option<i32>,
    /// `NaN` when the quantity is missing or not a number.
    pub quantity: f64,
}

/// One way of locating the document validity interval element.
pub type ValidityStrategy = fn(&XmlElement) -> Option<&XmlElement>;

/// Validity interval lookups, tried in order; the first hit wins.
pub const VALIDITY_STRATEGIES: [(&str, ValidityStrategy); 3] = [
    ("direct_path", direct_path),
    ("dotted_key", dotted_key),
    ("substring_scan", substring_scan),
];

/// `<unavailability_Time_Period><timeInterval>`
pub fn direct_path(root: &XmlElement) -> Option<&XmlElement> {
    root.child(VALIDITY_PARENT)?.child(VALIDITY_CHILD)
}

/// `<unavailability_Time_Period.timeInterval>`
pub fn dotted_key(root: &XmlElement) -> Option<&XmlElement> {
    root.child(&format!("{VALIDITY_PARENT}.{VALIDITY_CHILD}"))
}

/// First first- or second-level element whose name contains `timeInterval`.
///
/// Each first-level element is checked before its own children, then the scan
/// moves on to the next first-level element.
pub fn substring_scan(root: &XmlElement) -> Option<&XmlElement> {
    for child in &root.children {
        if child.name.contains(VALIDITY_CHILD) {
            return Some(child);
        }
        if let Some(grandchild) = child
            .children
            .iter()
            .find(|grandchild| grandchild.name.contains(VALIDITY_CHILD))
        {
            return Some(grandchild);
        }
    }
    None
}

/// Locate the validity interval element, naming the strategy that found it.
pub fn locate_validity_interval(root: &XmlElement) -> Option<(&'static str, &XmlElement)> {
    VALIDITY_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(root).map(|element| (*name, element)))
}

/// Parse an instant as found in market documents.
///
/// Accepts RFC 3339, minute precision with a `Z` or offset suffix
/// (`2025-01-01T23:00Z`), naive date-times taken as UTC and bare dates taken as
/// UTC midnight. Returns `None` for anything else.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M%#z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let naive = value.strip_suffix('Z').unwrap_or(value);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Parse a floating point quantity; malformed text yields `NaN`.
pub fn parse_quantity(raw: Option<&str>) -> f64 {
    raw.and_then(|text| text.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Extract one market document from raw XML text.
pub fn extract_document(raw: &str) -> Result<ExtractedDocument, IngestError> {
    let root = xml::parse_document(raw)?.ok_or_else(|| IngestError::MissingRoot {
        found: String::new(),
    })?;

    let document = if root.name == ROOT_ELEMENT {
        &root
    } else {
        // Some exports wrap the document in an envelope element.
        root.child(ROOT_ELEMENT)
            .ok_or_else(|| IngestError::MissingRoot {
                found: root.name.clone(),
            })?
    };

    extract_from_element(document)
}

/// Extract from an already parsed `Unavailability_MarketDocument` element.
pub fn extract_from_element(doc: &XmlElement) -> Result<ExtractedDocument, IngestError> {
    let (strategy, interval) =
        locate_validity_interval(doc).ok_or(IngestError::MissingValidityInterval)?;
    tracing::debug!(strategy, "located document validity interval");

    let validity = TimeInterval {
        start: required_instant(interval, "start", "timeInterval.start")?,
        end: required_instant(interval, "end", "timeInterval.end")?,
    };

    let m_rid = doc
        .text_at("mRID")
        .ok_or_else(|| missing("mRID"))?
        .to_string();

    let revision_number = doc
        .text_at("revisionNumber")
        .ok_or_else(|| missing("revisionNumber"))
        .and_then(|text| {
            text.parse::<i32>()
                .map_err(|err| IngestError::InvalidDocument {
                    field: "revisionNumber",
                    reason: format!("'{text}' is not an integer: {err}"),
                })
        })?;

    let created_date_time = required_instant(doc, "createdDateTime", "createdDateTime")?;

    let time_series = doc
        .children_named("TimeSeries")
        .map(extract_time_series)
        .collect();

    Ok(ExtractedDocument {
        m_rid,
        revision_number,
        doc_type: owned_or_default(doc.text_at("type")),
        process_type: owned(doc.text_at("process.processType")),
        created_date_time,
        validity,
        reason_code: owned(doc.text_at("Reason.code")),
        time_series,
    })
}

fn extract_time_series(ts: &XmlElement) -> ExtractedTimeSeries {
    const RESOURCE: &str = "production_RegisteredResource";
    const POWER_SYSTEM: &str = "production_RegisteredResource.pSRType.powerSystemResources";

    let periods = ts
        .find_all("Available_Period")
        .into_iter()
        .map(extract_period)
        .collect();

    ExtractedTimeSeries {
        m_rid: owned_or_default(ts.text_at("mRID")),
        business_type: owned_or_default(ts.text_at("businessType")),
        bidding_zone: coded_at(ts, "biddingZone_Domain.mRID").unwrap_or_default(),
        start: combine_date_time(ts, "start_DateAndOrTime"),
        end: combine_date_time(ts, "end_DateAndOrTime"),
        quantity_unit: ts
            .text_at("quantity_Measure_Unit.name")
            .unwrap_or(DEFAULT_UNIT)
            .to_string(),
        curve_type: owned(ts.text_at("curveType")),
        resource_m_rid: coded_at(ts, &format!("{RESOURCE}.mRID")).unwrap_or_default(),
        resource_name: owned_or_default(ts.text_at(&format!("{RESOURCE}.name"))),
        resource_location: owned(ts.text_at(&format!("{RESOURCE}.location.name"))),
        resource_type: owned(ts.text_at(&format!("{RESOURCE}.pSRType.psrType"))),
        power_system_m_rid: coded_at(ts, &format!("{POWER_SYSTEM}.mRID")),
        power_system_name: owned(ts.text_at(&format!("{POWER_SYSTEM}.name"))),
        nominal_power: ts
            .find(&format!("{POWER_SYSTEM}.nominalP"))
            .and_then(extract_nominal_power),
        periods,
    }
}

fn extract_period(period: &XmlElement) -> ExtractedPeriod {
    let points = period
        .find_all("Point")
        .into_iter()
        .map(|point| ExtractedPoint {
            position: point
                .text_at("position")
                .and_then(|text| text.parse::<i32>().ok()),
            quantity: parse_quantity(point.text_at("quantity")),
        })
        .collect();

    ExtractedPeriod {
        start: period.text_at("timeInterval.start").and_then(parse_instant),
        end: period.text_at("timeInterval.end").and_then(parse_instant),
        resolution: owned(period.text_at("resolution")),
        points,
    }
}

/// Numeric text plus its `unit` attribute; an empty element counts as absent.
fn extract_nominal_power(element: &XmlElement) -> Option<NominalPower> {
    let text = element.text()?;
    Some(NominalPower {
        value: parse_quantity(Some(text)),
        unit: element
            .attribute("unit")
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .unwrap_or(DEFAULT_UNIT)
            .to_string(),
    })
}

/// `<prefix>.date` and `<prefix>.time` joined into one instant, when both exist.
fn combine_date_time(ts: &XmlElement, prefix: &str) -> Option<DateTime<Utc>> {
    let date = ts.text_at(&format!("{prefix}.date"))?;
    let time = ts.text_at(&format!("{prefix}.time"))?;
    parse_instant(&format!("{date}T{time}"))
}

fn coded_at(element: &XmlElement, path: &str) -> Option<String> {
    element
        .find(path)
        .map(|found| CodedValue::from_element(found).normalize())
}

fn required_instant(
    element: &XmlElement,
    path: &str,
    field: &'static str,
) -> Result<DateTime<Utc>, IngestError> {
    let text = element.text_at(path).ok_or_else(|| missing(field))?;
    parse_instant(text).ok_or_else(|| IngestError::InvalidDocument {
        field,
        reason: format!("'{text}' is not a valid instant"),
    })
}

fn missing(field: &'static str) -> IngestError {
    IngestError::InvalidDocument {
        field,
        reason: "element is missing or empty".to_string(),
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn owned_or_default(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}
