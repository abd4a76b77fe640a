//! Seeding the outage store from XML fixtures and reading it back through the
//! aggregation service.

use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use greenergy::error::IngestError;
use greenergy::ingest::{SeaOrmOutageSink, SeedOptions, ingest_document, seed_outages};
use greenergy::models::UnavailabilityFilter;
use greenergy::repositories::{MarketDocumentRepository, TimeSeriesRepository};
use greenergy::services::UnavailabilityService;
use sea_orm::DatabaseConnection;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{GROUPED_TOTAL, RAW_TOTAL, fixtures_dir, setup_test_db_arc, stage_fixtures};

const ALL_FIXTURES: [&str; 4] = [
    "broken.xml",
    "not_outage.xml",
    "outage_gravelines.xml",
    "outage_paks.xml",
];

fn service(db: &Arc<DatabaseConnection>) -> UnavailabilityService {
    UnavailabilityService::new(Arc::new(TimeSeriesRepository::new(db.clone())))
}

#[tokio::test]
async fn seeding_skips_bad_files_and_stores_the_rest() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = stage_fixtures(&ALL_FIXTURES)?;

    let summary = seed_outages(db.clone(), dir.path(), SeedOptions::default()).await?;

    assert_eq!(summary.files_seen, 4);
    assert_eq!(summary.files_ingested, 2);
    let skipped: Vec<String> = summary
        .files_skipped
        .iter()
        .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(skipped, vec!["broken.xml", "not_outage.xml"]);

    assert_eq!(summary.records.time_series_created, 4);
    assert_eq!(summary.records.time_series_interval_fallbacks, 1);
    assert_eq!(summary.records.periods_created, 4);
    assert_eq!(summary.records.periods_skipped, 1);
    assert_eq!(summary.records.points_created, 5);

    assert_eq!(MarketDocumentRepository::new(db.clone()).count().await?, 2);
    assert_eq!(TimeSeriesRepository::new(db.clone()).count().await?, 4);
    Ok(())
}

#[tokio::test]
async fn reseeding_clears_previous_data() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = stage_fixtures(&ALL_FIXTURES)?;

    let first = seed_outages(db.clone(), dir.path(), SeedOptions::default()).await?;
    assert_eq!(first.documents_cleared, 0);

    let second = seed_outages(db.clone(), dir.path(), SeedOptions::default()).await?;
    assert_eq!(second.documents_cleared, 2);

    assert_eq!(MarketDocumentRepository::new(db.clone()).count().await?, 2);
    assert_eq!(TimeSeriesRepository::new(db.clone()).count().await?, 4);
    Ok(())
}

#[tokio::test]
async fn keeping_existing_data_duplicates_children_but_not_documents() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = stage_fixtures(&["outage_gravelines.xml", "outage_paks.xml"])?;
    let keep = SeedOptions {
        clear_existing: false,
    };

    seed_outages(db.clone(), dir.path(), keep).await?;
    seed_outages(db.clone(), dir.path(), keep).await?;

    assert_eq!(MarketDocumentRepository::new(db.clone()).count().await?, 2);
    assert_eq!(TimeSeriesRepository::new(db.clone()).count().await?, 8);

    // Duplicated series share their group key, so the grouped view is unchanged.
    let service = service(&db);
    let filter = UnavailabilityFilter::default();
    let raw = service.list(&filter).await?;
    let grouped = service.list_grouped(&filter).await?;
    assert_eq!(raw.stats.total_unavailable_capacity, 2.0 * RAW_TOTAL);
    assert_eq!(grouped.total, 3);
    assert_eq!(grouped.stats.total_unavailable_capacity, GROUPED_TOTAL);
    Ok(())
}

#[tokio::test]
async fn document_upsert_overwrites_fields_and_keeps_id() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let sink = SeaOrmOutageSink::new(db.clone());
    let xml = std::fs::read_to_string(fixtures_dir().join("outage_paks.xml"))?;

    ingest_document(&sink, &xml, "outage_paks.xml").await?;
    let documents = MarketDocumentRepository::new(db.clone());
    let original = documents.find_by_mrid("DOC-PAKS-1").await?.unwrap();
    assert_eq!(original.revision_number, 2);
    assert_eq!(original.reason_code.as_deref(), Some("B18"));

    let revised = xml
        .replace("<revisionNumber>2</revisionNumber>", "<revisionNumber>3</revisionNumber>")
        .replace("<code>B18</code>", "<code>B20</code>");
    ingest_document(&sink, &revised, "outage_paks_rev3.xml").await?;

    let updated = documents.find_by_mrid("DOC-PAKS-1").await?.unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.revision_number, 3);
    assert_eq!(updated.reason_code.as_deref(), Some("B20"));
    assert_eq!(documents.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn missing_directory_fails_the_batch() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = tempfile::TempDir::new()?;
    let missing = dir.path().join("does-not-exist");

    let err = seed_outages(db, &missing, SeedOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
    Ok(())
}

#[tokio::test]
async fn aggregation_over_seeded_store() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = stage_fixtures(&ALL_FIXTURES)?;
    seed_outages(db.clone(), dir.path(), SeedOptions::default()).await?;
    let service = service(&db);
    let all = UnavailabilityFilter::default();

    let raw = service.list(&all).await?;
    assert_eq!(raw.total, 4);
    assert_eq!(raw.stats.total_unavailable_capacity, RAW_TOTAL);
    assert_eq!(raw.items[0].resource_name, "Gravelines 5");
    assert_eq!(raw.items[0].reason_code.as_deref(), Some("B19"));
    assert_eq!(raw.items[0].unavailable_capacity, Some(900.0));
    assert_eq!(
        raw.items[0].start_time,
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
    );
    assert!(raw.items.windows(2).all(|w| w[0].start_time <= w[1].start_time));

    let grouped = service.list_grouped(&all).await?;
    assert_eq!(grouped.total, 3);
    assert_eq!(grouped.stats.total_unavailable_capacity, GROUPED_TOTAL);
    assert!(grouped.items.iter().any(|i| i.resource_name == "Paks 1 (revised)"));
    assert!(!grouped.items.iter().any(|i| i.resource_name == "Paks 1"));

    let stats = service.stats(&all, true).await?;
    assert_eq!(stats.total_unavailable_capacity, GROUPED_TOTAL);
    let stats = service.stats(&all, false).await?;
    assert_eq!(stats.total_unavailable_capacity, RAW_TOTAL);
    Ok(())
}

#[tokio::test]
async fn filters_apply_in_the_store() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = stage_fixtures(&["outage_gravelines.xml", "outage_paks.xml"])?;
    seed_outages(db.clone(), dir.path(), SeedOptions::default()).await?;
    let service = service(&db);

    let by_name = UnavailabilityFilter {
        resource_name: Some("PAKS".to_string()),
        ..Default::default()
    };
    assert_eq!(service.list(&by_name).await?.total, 3);

    let by_location = UnavailabilityFilter {
        resource_location: Some("grave".to_string()),
        ..Default::default()
    };
    let response = service.list(&by_location).await?;
    assert_eq!(response.total, 1);
    assert_eq!(response.stats.total_unavailable_capacity, 900.0);

    let from_march = UnavailabilityFilter {
        start_date: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    assert_eq!(service.list(&from_march).await?.total, 3);

    let until_mid_march = UnavailabilityFilter {
        end_date: Some(Utc.with_ymd_and_hms(2025, 3, 12, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    let response = service.list(&until_mid_march).await?;
    assert_eq!(response.total, 3);
    assert!(response.items.iter().all(|i| i.resource_name != "Paks 2"));

    let wildcard = UnavailabilityFilter {
        resource_name: Some("%".to_string()),
        ..Default::default()
    };
    assert_eq!(service.list(&wildcard).await?.total, 0);
    Ok(())
}

#[tokio::test]
async fn date_filter_bounds_are_inclusive() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = stage_fixtures(&["outage_paks.xml"])?;
    seed_outages(db.clone(), dir.path(), SeedOptions::default()).await?;
    let service = service(&db);

    // "Paks 2" runs exactly from 03-15T00:00 to 03-20T00:00.
    let exact = UnavailabilityFilter {
        start_date: Some(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap()),
        end_date: Some(Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    let response = service.list(&exact).await?;
    assert_eq!(response.total, 1);
    assert_eq!(response.items[0].resource_name, "Paks 2");

    let start_one_second_late = UnavailabilityFilter {
        start_date: Some(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 1).unwrap()),
        ..Default::default()
    };
    assert_eq!(service.list(&start_one_second_late).await?.total, 0);

    let end_one_second_early = UnavailabilityFilter {
        end_date: Some(Utc.with_ymd_and_hms(2025, 3, 19, 23, 59, 59).unwrap()),
        ..Default::default()
    };
    let response = service.list(&end_one_second_early).await?;
    assert_eq!(response.total, 2);
    assert!(response.items.iter().all(|i| i.resource_name != "Paks 2"));

    // Both "Paks 1" series span 03-03T06:00 to 03-10T18:00.
    let paks_1_window = UnavailabilityFilter {
        start_date: Some(Utc.with_ymd_and_hms(2025, 3, 3, 6, 0, 0).unwrap()),
        end_date: Some(Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap()),
        ..Default::default()
    };
    let response = service.list(&paks_1_window).await?;
    assert_eq!(response.total, 2);
    assert!(response.items.iter().all(|i| i.resource_name.starts_with("Paks 1")));
    Ok(())
}

#[tokio::test]
async fn malformed_numbers_are_stored_and_propagate_as_nan() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let dir = tempfile::TempDir::new()?;
    let gravelines = std::fs::read_to_string(fixtures_dir().join("outage_gravelines.xml"))?
        .replace("<quantity>0</quantity>", "<quantity>0x</quantity>");
    let paks = std::fs::read_to_string(fixtures_dir().join("outage_paks.xml"))?.replace(
        r#"nominalP unit="MAW">500</production_RegisteredResource.pSRType.powerSystemResources.nominalP>
    <Available_Period>
      <timeInterval>
        <start>2025-03-15"#,
        r#"nominalP unit="MAW">9oo</production_RegisteredResource.pSRType.powerSystemResources.nominalP>
    <Available_Period>
      <timeInterval>
        <start>2025-03-15"#,
    );
    assert!(paks.contains(">9oo<"));
    std::fs::write(dir.path().join("a_gravelines.xml"), gravelines)?;
    std::fs::write(dir.path().join("b_paks.xml"), paks)?;

    let summary = seed_outages(db.clone(), dir.path(), SeedOptions::default()).await?;
    assert_eq!(summary.files_ingested, 2);
    assert!(summary.files_skipped.is_empty());
    assert_eq!(summary.records.time_series_created, 4);
    assert_eq!(summary.records.points_created, 5);

    let response = service(&db).list(&UnavailabilityFilter::default()).await?;
    assert_eq!(response.total, 4);
    assert!(response.stats.total_unavailable_capacity.is_nan());

    let by_name = |name: &str| {
        response
            .items
            .iter()
            .find(|i| i.resource_name == name)
            .unwrap()
            .clone()
    };

    let gravelines = by_name("Gravelines 5");
    assert_eq!(gravelines.nominal_power, Some(900.0));
    assert!(gravelines.available_capacity.unwrap().is_nan());
    assert!(gravelines.unavailable_capacity.unwrap().is_nan());

    let paks_2 = by_name("Paks 2");
    assert!(paks_2.nominal_power.unwrap().is_nan());
    assert!(paks_2.unavailable_capacity.unwrap().is_nan());

    assert_eq!(by_name("Paks 1").unavailable_capacity, Some(300.0));
    Ok(())
}
