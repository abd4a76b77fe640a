//! Outage ingestion
//!
//! Turns `Unavailability_MarketDocument` files into stored market documents,
//! time series, available periods and points. Files are processed one at a
//! time and records are written parent first, so every child write sees its
//! parent id.
//!
//! Failure handling follows three levels:
//! * a per-file problem (unreadable file, bad XML, wrong root, no validity
//!   interval, missing required document field) skips that file;
//! * a time series or available period without interval bounds is skipped
//!   while its siblings are kept;
//! * a store error aborts the whole batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr};
use uuid::Uuid;

use crate::error::IngestError;
use crate::extract::{self, ExtractedDocument, ExtractedTimeSeries, TimeInterval};
use crate::repositories::{
    AvailablePeriodRepository, MarketDocumentRepository, NewAvailablePeriod, NewMarketDocument,
    NewPoint, NewTimeSeries, PointRepository, TimeSeriesRepository,
};

/// Destination of mapped records.
#[async_trait]
pub trait OutageSink: Send + Sync {
    /// Insert or overwrite the document with the same `m_rid`; returns its id.
    async fn upsert_market_document(&self, document: &NewMarketDocument) -> Result<Uuid, DbErr>;
    async fn create_time_series(&self, series: &NewTimeSeries) -> Result<Uuid, DbErr>;
    async fn create_available_period(&self, period: &NewAvailablePeriod) -> Result<Uuid, DbErr>;
    async fn create_point(&self, point: &NewPoint) -> Result<Uuid, DbErr>;
}

/// [`OutageSink`] writing through the SeaORM repositories.
#[derive(Debug, Clone)]
pub struct SeaOrmOutageSink {
    documents: MarketDocumentRepository,
    time_series: TimeSeriesRepository,
    periods: AvailablePeriodRepository,
    points: PointRepository,
}

impl SeaOrmOutageSink {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            documents: MarketDocumentRepository::new(db.clone()),
            time_series: TimeSeriesRepository::new(db.clone()),
            periods: AvailablePeriodRepository::new(db.clone()),
            points: PointRepository::new(db),
        }
    }
}

#[async_trait]
impl OutageSink for SeaOrmOutageSink {
    async fn upsert_market_document(&self, document: &NewMarketDocument) -> Result<Uuid, DbErr> {
        Ok(self.documents.upsert_by_mrid(document).await?.id)
    }

    async fn create_time_series(&self, series: &NewTimeSeries) -> Result<Uuid, DbErr> {
        Ok(self.time_series.create(series).await?.id)
    }

    async fn create_available_period(&self, period: &NewAvailablePeriod) -> Result<Uuid, DbErr> {
        Ok(self.periods.create(period).await?.id)
    }

    async fn create_point(&self, point: &NewPoint) -> Result<Uuid, DbErr> {
        Ok(self.points.create(point).await?.id)
    }
}

/// Counts of records written or skipped for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub time_series_created: usize,
    pub time_series_skipped: usize,
    /// Time series whose interval came partly or wholly from the document.
    pub time_series_interval_fallbacks: usize,
    pub periods_created: usize,
    pub periods_skipped: usize,
    pub points_created: usize,
}

impl IngestReport {
    fn absorb(&mut self, other: &IngestReport) {
        self.time_series_created += other.time_series_created;
        self.time_series_skipped += other.time_series_skipped;
        self.time_series_interval_fallbacks += other.time_series_interval_fallbacks;
        self.periods_created += other.periods_created;
        self.periods_skipped += other.periods_skipped;
        self.points_created += other.points_created;
    }
}

/// Batch options for [`seed_outages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    /// Delete all existing outage data before ingesting, when any exists.
    pub clear_existing: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            clear_existing: true,
        }
    }
}

/// Outcome of a seeding batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub documents_cleared: u64,
    pub files_seen: usize,
    pub files_ingested: usize,
    /// Files skipped with the reason, in processing order.
    pub files_skipped: Vec<(PathBuf, String)>,
    pub records: IngestReport,
}

/// Resolve a time series interval, filling each missing bound from `fallback`.
///
/// Returns the interval and whether the fallback was used, or `None` when a
/// bound is still missing.
pub fn resolve_interval(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    fallback: Option<TimeInterval>,
) -> Option<(TimeInterval, bool)> {
    let used_fallback = start.is_none() || end.is_none();
    let start = start.or(fallback.map(|interval| interval.start))?;
    let end = end.or(fallback.map(|interval| interval.end))?;
    Some((TimeInterval { start, end }, used_fallback))
}

/// Write an extracted document and its descendants to `sink`.
pub async fn map_document(
    sink: &dyn OutageSink,
    document: &ExtractedDocument,
    source: &str,
) -> Result<IngestReport, IngestError> {
    let document_id = sink
        .upsert_market_document(&NewMarketDocument {
            m_rid: document.m_rid.clone(),
            revision_number: document.revision_number,
            doc_type: document.doc_type.clone(),
            process_type: document.process_type.clone(),
            created_date_time: document.created_date_time,
            start_time: document.validity.start,
            end_time: document.validity.end,
            reason_code: document.reason_code.clone(),
        })
        .await?;

    tracing::debug!(
        source,
        document = %document.m_rid,
        time_series = document.time_series.len(),
        "upserted market document"
    );

    let mut report = IngestReport::default();
    for series in &document.time_series {
        map_time_series(sink, document, document_id, series, source, &mut report).await?;
    }

    Ok(report)
}

async fn map_time_series(
    sink: &dyn OutageSink,
    document: &ExtractedDocument,
    document_id: Uuid,
    series: &ExtractedTimeSeries,
    source: &str,
    report: &mut IngestReport,
) -> Result<(), IngestError> {
    let Some((interval, used_fallback)) =
        resolve_interval(series.start, series.end, Some(document.validity))
    else {
        tracing::warn!(
            source,
            document = %document.m_rid,
            time_series = %series.m_rid,
            "time series has no start or end time, skipping"
        );
        report.time_series_skipped += 1;
        counter!("outage_ingest_time_series_total", "outcome" => "skipped").increment(1);
        return Ok(());
    };

    if used_fallback {
        tracing::info!(
            source,
            time_series = %series.m_rid,
            "using document validity interval for time series"
        );
        report.time_series_interval_fallbacks += 1;
    }

    let (nominal_power, nominal_power_unit) = match &series.nominal_power {
        Some(nominal) => (Some(nominal.value), nominal.unit.clone()),
        None => (None, extract::DEFAULT_UNIT.to_string()),
    };

    let series_id = sink
        .create_time_series(&NewTimeSeries {
            market_document_id: document_id,
            m_rid: series.m_rid.clone(),
            business_type: series.business_type.clone(),
            bidding_zone: series.bidding_zone.clone(),
            start_time: interval.start,
            end_time: interval.end,
            quantity_unit: series.quantity_unit.clone(),
            curve_type: series.curve_type.clone(),
            resource_m_rid: series.resource_m_rid.clone(),
            resource_name: series.resource_name.clone(),
            resource_location: series.resource_location.clone(),
            resource_type: series.resource_type.clone(),
            power_system_m_rid: series.power_system_m_rid.clone(),
            power_system_name: series.power_system_name.clone(),
            nominal_power,
            nominal_power_unit,
        })
        .await?;
    report.time_series_created += 1;
    counter!("outage_ingest_time_series_total", "outcome" => "created").increment(1);

    for period in &series.periods {
        let (Some(start), Some(end)) = (period.start, period.end) else {
            tracing::warn!(
                source,
                time_series = %series.m_rid,
                "available period has no time interval, skipping"
            );
            report.periods_skipped += 1;
            continue;
        };

        let period_id = sink
            .create_available_period(&NewAvailablePeriod {
                time_series_id: series_id,
                start_time: start,
                end_time: end,
                resolution: period.resolution.clone(),
            })
            .await?;
        report.periods_created += 1;

        for point in &period.points {
            if point.quantity.is_nan() {
                tracing::warn!(
                    source,
                    time_series = %series.m_rid,
                    position = ?point.position,
                    "point quantity is not a number"
                );
            }
            sink.create_point(&NewPoint {
                available_period_id: period_id,
                position: point.position,
                quantity: point.quantity,
            })
            .await?;
            report.points_created += 1;
        }
    }

    Ok(())
}

/// Extract and write one document given as XML text.
///
/// `source` names the document in logs (usually the file name).
pub async fn ingest_document(
    sink: &dyn OutageSink,
    xml: &str,
    source: &str,
) -> Result<IngestReport, IngestError> {
    let document = extract::extract_document(xml)?;
    map_document(sink, &document, source).await
}

/// Read, extract and write one file.
pub async fn ingest_file(sink: &dyn OutageSink, path: &Path) -> Result<IngestReport, IngestError> {
    let xml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    ingest_document(sink, &xml, &source).await
}

/// `*.xml` files directly inside `dir`, sorted by file name.
pub async fn list_xml_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_error = |source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        let is_xml = path.extension().is_some_and(|ext| ext == "xml");
        if is_xml && entry.file_type().await.map_err(io_error)?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Ingest every `*.xml` file in `dir` into the database.
///
/// With [`SeedOptions::clear_existing`], existing outage data is deleted first
/// when any market document is stored. Per-file failures are logged and
/// recorded in the summary; a store failure aborts the batch.
pub async fn seed_outages(
    db: Arc<DatabaseConnection>,
    dir: &Path,
    options: SeedOptions,
) -> Result<SeedSummary, IngestError> {
    tracing::info!(dir = %dir.display(), "starting outage seeding");

    let mut summary = SeedSummary::default();

    if options.clear_existing {
        let documents = MarketDocumentRepository::new(db.clone());
        let existing = documents.count().await?;
        if existing > 0 {
            tracing::info!(existing, "clearing existing outage data");
            summary.documents_cleared = documents.delete_all().await?;
        }
    }

    let files = list_xml_files(dir).await?;
    summary.files_seen = files.len();
    tracing::info!(files = files.len(), "found XML files to process");

    let sink = SeaOrmOutageSink::new(db);
    for path in files {
        match ingest_file(&sink, &path).await {
            Ok(report) => {
                tracing::info!(
                    file = %path.display(),
                    time_series = report.time_series_created,
                    time_series_skipped = report.time_series_skipped,
                    periods = report.periods_created,
                    points = report.points_created,
                    "processed file"
                );
                counter!("outage_ingest_files_total", "outcome" => "ingested").increment(1);
                summary.files_ingested += 1;
                summary.records.absorb(&report);
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(file = %path.display(), error = %err, "aborting outage seeding");
                counter!("outage_ingest_files_total", "outcome" => "failed").increment(1);
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    file = %path.display(),
                    reason = err.kind(),
                    error = %err,
                    "skipping file"
                );
                counter!("outage_ingest_files_total", "outcome" => "skipped").increment(1);
                summary.files_skipped.push((path, err.to_string()));
            }
        }
    }

    tracing::info!(
        files_ingested = summary.files_ingested,
        files_skipped = summary.files_skipped.len(),
        time_series = summary.records.time_series_created,
        "outage seeding completed"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Write {
        Document(NewMarketDocument),
        Series(NewTimeSeries),
        Period(NewAvailablePeriod),
        Point(NewPoint),
    }

    /// Sink recording every write, optionally failing on time series.
    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(Uuid, Write)>>,
        fail_series: bool,
    }

    impl RecordingSink {
        fn record(&self, write: Write) -> Uuid {
            let id = Uuid::new_v4();
            self.writes.lock().unwrap().push((id, write));
            id
        }

        fn writes(&self) -> Vec<(Uuid, Write)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutageSink for RecordingSink {
        async fn upsert_market_document(&self, document: &NewMarketDocument) -> Result<Uuid, DbErr> {
            Ok(self.record(Write::Document(document.clone())))
        }

        async fn create_time_series(&self, series: &NewTimeSeries) -> Result<Uuid, DbErr> {
            if self.fail_series {
                return Err(DbErr::Custom("connection lost".to_string()));
            }
            Ok(self.record(Write::Series(series.clone())))
        }

        async fn create_available_period(&self, period: &NewAvailablePeriod) -> Result<Uuid, DbErr> {
            Ok(self.record(Write::Period(period.clone())))
        }

        async fn create_point(&self, point: &NewPoint) -> Result<Uuid, DbErr> {
            Ok(self.record(Write::Point(point.clone())))
        }
    }

    const DOCUMENT: &str = r#"<Unavailability_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-6:outagedocument:4:1">
  <mRID>DOC-7</mRID>
  <revisionNumber>1</revisionNumber>
  <type>A80</type>
  <createdDateTime>2025-01-02T10:15:00Z</createdDateTime>
  <unavailability_Time_Period.timeInterval>
    <start>2025-01-01T00:00Z</start>
    <end>2025-02-01T00:00Z</end>
  </unavailability_Time_Period.timeInterval>
  <Reason><code>B18</code></Reason>
  <TimeSeries>
    <mRID>1</mRID>
    <businessType>A53</businessType>
    <start_DateAndOrTime.date>2025-01-05</start_DateAndOrTime.date>
    <start_DateAndOrTime.time>06:00:00Z</start_DateAndOrTime.time>
    <end_DateAndOrTime.date>2025-01-06</end_DateAndOrTime.date>
    <end_DateAndOrTime.time>18:00:00Z</end_DateAndOrTime.time>
    <production_RegisteredResource.name>Unit A</production_RegisteredResource.name>
    <production_RegisteredResource.pSRType.powerSystemResources.nominalP unit="MAW">200</production_RegisteredResource.pSRType.powerSystemResources.nominalP>
    <Available_Period>
      <timeInterval><start>2025-01-05T06:00Z</start><end>2025-01-06T18:00Z</end></timeInterval>
      <resolution>PT1M</resolution>
      <Point><position>1</position><quantity>0</quantity></Point>
      <Point><position>2</position><quantity>50</quantity></Point>
    </Available_Period>
    <Available_Period>
      <resolution>PT1M</resolution>
      <Point><position>1</position><quantity>10</quantity></Point>
    </Available_Period>
  </TimeSeries>
  <TimeSeries>
    <mRID>2</mRID>
    <businessType>A54</businessType>
    <production_RegisteredResource.name>Unit B</production_RegisteredResource.name>
  </TimeSeries>
</Unavailability_MarketDocument>"#;

    #[tokio::test]
    async fn writes_records_parent_first() {
        let sink = RecordingSink::default();
        let report = ingest_document(&sink, DOCUMENT, "doc.xml").await.unwrap();

        assert_eq!(
            report,
            IngestReport {
                time_series_created: 2,
                time_series_skipped: 0,
                time_series_interval_fallbacks: 1,
                periods_created: 1,
                periods_skipped: 1,
                points_created: 2,
            }
        );

        let writes = sink.writes();
        let (doc_id, Write::Document(doc)) = &writes[0] else {
            panic!("first write must be the document");
        };
        assert_eq!(doc.m_rid, "DOC-7");
        assert_eq!(doc.reason_code.as_deref(), Some("B18"));

        let (series_id, Write::Series(series)) = &writes[1] else {
            panic!("second write must be a time series");
        };
        assert_eq!(series.market_document_id, *doc_id);
        assert_eq!(series.nominal_power, Some(200.0));
        assert_eq!(series.nominal_power_unit, "MAW");
        assert_eq!(series.quantity_unit, "MAW");
        assert_eq!(series.bidding_zone, "");

        let (period_id, Write::Period(period)) = &writes[2] else {
            panic!("third write must be a period");
        };
        assert_eq!(period.time_series_id, *series_id);

        let quantities: Vec<f64> = writes
            .iter()
            .filter_map(|(_, write)| match write {
                Write::Point(point) if point.available_period_id == *period_id => {
                    Some(point.quantity)
                }
                _ => None,
            })
            .collect();
        assert_eq!(quantities, vec![0.0, 50.0]);
    }

    #[tokio::test]
    async fn series_without_dates_falls_back_to_document_interval() {
        let sink = RecordingSink::default();
        ingest_document(&sink, DOCUMENT, "doc.xml").await.unwrap();

        let fallback = sink
            .writes()
            .into_iter()
            .find_map(|(_, write)| match write {
                Write::Series(series) if series.m_rid == "2" => Some(series),
                _ => None,
            })
            .unwrap();

        assert_eq!(fallback.start_time, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(fallback.end_time, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(fallback.nominal_power, None);
    }

    #[test]
    fn resolve_interval_fills_each_bound_independently() {
        let doc = TimeInterval {
            start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
        };
        let own_start = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();

        let (interval, used) = resolve_interval(Some(own_start), None, Some(doc)).unwrap();
        assert_eq!(interval.start, own_start);
        assert_eq!(interval.end, doc.end);
        assert!(used);

        let (_, used) = resolve_interval(Some(doc.start), Some(doc.end), None).unwrap();
        assert!(!used);

        assert!(resolve_interval(Some(own_start), None, None).is_none());
    }

    #[tokio::test]
    async fn per_file_failures_are_not_fatal() {
        let sink = RecordingSink::default();

        let err = ingest_document(&sink, "<Unavailability_MarketDocument><mRID>", "broken.xml")
            .await
            .unwrap_err();
        assert!(!err.is_fatal());

        let err = ingest_document(
            &sink,
            "<Unavailability_MarketDocument><mRID>X</mRID></Unavailability_MarketDocument>",
            "no-interval.xml",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IngestError::MissingValidityInterval));

        assert!(sink.writes().is_empty());
    }

    #[tokio::test]
    async fn store_failures_are_fatal() {
        let sink = RecordingSink {
            fail_series: true,
            ..Default::default()
        };

        let err = ingest_document(&sink, DOCUMENT, "doc.xml").await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let sink = RecordingSink::default();
        let err = ingest_file(&sink, Path::new("/nonexistent/outage.xml"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn lists_only_xml_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.xml", "a.xml", "upper.XML", "notes.txt", "c.xml.bak"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.xml")).unwrap();

        let files = list_xml_files(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
    }
}
