//! End-to-end store scenarios through the facade: mixed-shape ingestion,
//! cache-gated fetching and snapshot persistence.

mod common;

use common::{flat_record, generic_record, rich_record, setup_test_logging, temp_dir, ScriptedService};
use roost::domain::models::{AreaUnit, BasicFilter, FilterCriteria, PropertyCategory};
use roost::services::normalizer::{classify, RecordShape};
use roost::{FetchOutcome, FileSnapshotStore, InsertMode, JsonFileService, Mutation, SnapshotStore, StoreError, StoreFacade};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_mixed_shapes_ingest_into_one_listing() {
    setup_test_logging();
    let facade = StoreFacade::new(Arc::new(ScriptedService::default()));
    let raw = vec![
        rich_record("r-1", "Casa Colonial", 850_000.0),
        flat_record("f-1", "Sunny Condo", "Condo", 240_000.0),
        generic_record("g-1", 99_000.0),
        json!({ "name": "No identifier", "address": "?", "price": 1 }),
        json!(["not", "an", "object"]),
    ];
    assert_eq!(classify(&raw[0]), RecordShape::Rich);
    assert_eq!(classify(&raw[1]), RecordShape::Flat);
    assert_eq!(classify(&raw[2]), RecordShape::Generic);

    let report = facade.ingest(&raw, InsertMode::Append);
    assert_eq!(report.accepted, vec!["r-1", "f-1", "g-1"]);
    let rejected: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, vec![3, 4]);
    assert!(report
        .rejected
        .iter()
        .all(|r| matches!(r.error, StoreError::MalformedRecord(_))));

    let rich = facade.select_by_id("r-1").unwrap();
    assert_eq!(rich.enabled_images().count(), 1);
    assert_eq!(rich.owner.as_ref().unwrap().name, "Ana Ruiz");
    assert_eq!(rich.traces.len(), 1);

    let flat = facade.select_by_id("f-1").unwrap();
    assert_eq!(flat.category, PropertyCategory::Apartment);
    assert_eq!(flat.area_unit, AreaUnit::SquareMeters);
    assert_eq!(flat.currency, "USD");
    assert!(flat.description.contains("12 Elm Street"));
    assert_eq!(flat.location.to_string(), "12 Elm Street, Springfield");

    let stats = facade.select_stats();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.max_price, Some(850_000.0));
}

#[test]
fn test_search_and_category_filters() {
    let facade = StoreFacade::new(Arc::new(ScriptedService::default()));
    facade.ingest(
        &[
            flat_record("1", "Harbor Loft", "Apartment", 300_000.0),
            flat_record("2", "Garden Villa", "Villa", 1_500_000.0),
            flat_record("3", "Studio Nine", "Studio", 120_000.0),
        ],
        InsertMode::Append,
    );

    let lofts = facade.select(&FilterCriteria::default().with_search("  LOFT "));
    assert_eq!(lofts.len(), 1);

    let springfield = facade.select(&FilterCriteria::default().with_search("springfield"));
    assert_eq!(springfield.len(), 3, "location is searched too");

    let empty_search = facade.select(&FilterCriteria::default().with_search(""));
    assert_eq!(empty_search.len(), 3, "empty search is no filter");

    let apartments = facade.select(&FilterCriteria::default().with_category(PropertyCategory::Apartment));
    let ids: Vec<String> = apartments.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, ["1", "3"]);

    let inverted = facade.select(&FilterCriteria::default().with_price_range(Some(500.0), Some(100.0)));
    assert!(inverted.is_empty());

    let expensive = facade.select(&FilterCriteria::default().with_basic(BasicFilter::Expensive));
    assert_eq!(expensive.len(), 1);
}

#[tokio::test]
async fn test_fetch_is_skipped_while_cache_is_valid() {
    let service = Arc::new(ScriptedService::with_listing(vec![
        generic_record("a", 10.0),
        generic_record("b", 20.0),
    ]));
    let facade = StoreFacade::new(Arc::clone(&service) as Arc<dyn roost::PropertyService>);

    let first = facade.fetch_list(FilterCriteria::default(), 1, 10, false).await.unwrap();
    assert!(matches!(first, FetchOutcome::Fetched { .. }));
    let second = facade.fetch_list(FilterCriteria::default(), 1, 10, false).await.unwrap();
    assert_eq!(second, FetchOutcome::Skipped);
    assert_eq!(service.list_calls(), 1);

    facade.clear();
    assert!(facade.select_current().is_empty());
    facade.fetch_list(FilterCriteria::default(), 1, 10, false).await.unwrap();
    assert_eq!(service.list_calls(), 2);
    assert_eq!(facade.select_current().len(), 2);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_listing() {
    let service = Arc::new(ScriptedService::with_listing(vec![generic_record("a", 10.0)]));
    let facade = StoreFacade::new(Arc::clone(&service) as Arc<dyn roost::PropertyService>);
    facade.fetch_list(FilterCriteria::default(), 1, 10, false).await.unwrap();

    service.fail("list");
    let err = facade
        .fetch_list(FilterCriteria::default().with_search("x"), 1, 10, false)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UpstreamFailure(_)));
    assert_eq!(facade.select_current().len(), 1);
    assert_eq!(facade.current_criteria(), FilterCriteria::default());
}

#[tokio::test]
async fn test_snapshot_survives_a_session_boundary() {
    let dir = temp_dir();
    let snapshots = FileSnapshotStore::new(dir.path().join("snapshot.json"));
    let service = Arc::new(JsonFileService::from_records(vec![
        rich_record("r-1", "Casa Colonial", 850_000.0),
        generic_record("g-1", 99_000.0),
    ]));

    let facade = StoreFacade::new(Arc::clone(&service) as Arc<dyn roost::PropertyService>);
    facade.fetch_list(FilterCriteria::default(), 1, 10, false).await.unwrap();
    facade.execute(Mutation::FetchById { id: "g-1".to_string() }).await.unwrap();
    facade.save_snapshot(&snapshots).await.unwrap();

    let next = StoreFacade::new(service);
    let report = next.restore_snapshot(&snapshots).await;
    assert!(report.is_clean());
    assert_eq!(next.select_stats().count, 2);
    assert_eq!(next.select_selected().unwrap().id, "g-1");
    assert!(!next.is_cache_valid(), "restored data always needs a refresh");
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let dir = temp_dir();
    let snapshots = FileSnapshotStore::new(dir.path().join("snapshot.json"));
    snapshots.save("{\"properties\": [ {\"broken\"").await.unwrap();

    let facade = StoreFacade::new(Arc::new(ScriptedService::default()));
    facade.ingest(&[generic_record("stale", 1.0)], InsertMode::Append);
    let report = facade.restore_snapshot(&snapshots).await;

    assert!(report.accepted.is_empty());
    assert_eq!(facade.select_stats().count, 0);
    assert!(facade.select_selected().is_none());

    let missing = FileSnapshotStore::new(dir.path().join("never-written.json"));
    let report = facade.restore_snapshot(&missing).await;
    assert!(report.is_clean());
}
