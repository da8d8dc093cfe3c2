use citydex::catalog::StaticCatalog;
use citydex::domain::{Coordinates, Entry, EntryId, ErrorKind, RawEntry};
use citydex::engine::{DirectoryEngine, LoadOutcome, LoadStatus};
use citydex::storage::{MemoryFavoriteStore, StoreOp};
use citydex::{DirectoryError, StoreEvent};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const BUENOS_AIRES: u64 = 3435910;
const NEW_YORK: u64 = 5128581;
const PARIS: u64 = 2988507;

fn cities() -> Vec<RawEntry> {
    vec![
        RawEntry::new(PARIS, "Paris", "FR", 48.8566, 2.3522),
        RawEntry::new(NEW_YORK, "New York", "US", 40.7128, -74.0060),
        RawEntry::new(BUENOS_AIRES, "Buenos Aires", "AR", -34.6037, -58.3816),
    ]
}

fn favorite(id: u64, name: &str, country: &str) -> Entry {
    Entry::new(EntryId(id), name, country, Coordinates::new(0.0, 0.0)).with_favorite(true)
}

struct Harness {
    engine: Arc<DirectoryEngine>,
    catalog: Arc<StaticCatalog>,
    store: Arc<MemoryFavoriteStore>,
}

fn harness(store: MemoryFavoriteStore) -> Harness {
    let catalog = Arc::new(StaticCatalog::new(cities()));
    let store = Arc::new(store);
    let engine = Arc::new(DirectoryEngine::new(catalog.clone(), store.clone()));
    Harness { engine, catalog, store }
}

fn with_default_favorites() -> Harness {
    harness(MemoryFavoriteStore::with_favorites(&[
        favorite(BUENOS_AIRES, "Buenos Aires", "AR"),
        favorite(PARIS, "Paris", "FR"),
    ]))
}

#[tokio::test]
async fn load_merges_favorites_and_sorts_by_name() {
    let h = with_default_favorites();

    let outcome = h.engine.load().await.unwrap();
    assert_eq!(outcome, LoadOutcome::Applied { entries: 3 });

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.status(), LoadStatus::Loaded(3));
    assert_eq!(snapshot.result_names(), vec!["Buenos Aires", "New York", "Paris"]);
    let flags: Vec<bool> = snapshot.results.iter().map(|e| e.is_favorite).collect();
    assert_eq!(flags, vec![true, false, true]);
    assert_eq!(snapshot.favorite_count, 2);
    assert_eq!(snapshot.selected.as_ref().map(|e| e.id), Some(EntryId(BUENOS_AIRES)));
}

#[tokio::test]
async fn favorites_are_keyed_by_id_not_name() {
    let h = harness(MemoryFavoriteStore::with_favorites(&[favorite(PARIS, "Paris", "FR")]));
    let mut catalog = cities();
    catalog.push(RawEntry::new(4717560, "Paris", "US", 33.66, -95.55));
    h.catalog.set_entries(catalog);

    h.engine.load().await.unwrap();
    h.engine.set_search_prefix("paris").unwrap();

    let snapshot = h.engine.snapshot();
    let rows: Vec<(&str, bool)> = snapshot
        .results
        .iter()
        .map(|e| (&*e.country, e.is_favorite))
        .collect();
    assert_eq!(rows, vec![("FR", true), ("US", false)]);
}

#[tokio::test]
async fn prefix_search_is_case_insensitive_and_anchored() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();

    h.engine.set_search_prefix("new").unwrap();
    assert_eq!(h.engine.snapshot().result_names(), vec!["New York"]);

    h.engine.set_search_prefix("NEW").unwrap();
    assert_eq!(h.engine.snapshot().result_names(), vec!["New York"]);

    h.engine.set_search_prefix("york").unwrap();
    assert!(h.engine.snapshot().results.is_empty());
    assert_eq!(h.engine.snapshot().selected, None);

    h.engine.set_search_prefix("").unwrap();
    assert_eq!(h.engine.snapshot().results.len(), 3);
}

#[tokio::test]
async fn favorite_filter_combines_with_prefix() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();

    h.engine.set_favorite_only(true).unwrap();
    assert_eq!(h.engine.snapshot().result_names(), vec!["Buenos Aires", "Paris"]);

    h.engine.set_search_prefix("Paris").unwrap();
    assert_eq!(h.engine.snapshot().result_names(), vec!["Paris"]);

    h.engine.set_search_prefix("New").unwrap();
    assert!(h.engine.snapshot().results.is_empty());
}

#[tokio::test]
async fn reload_resets_query_parameters() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();
    h.engine.set_search_prefix("par").unwrap();
    h.engine.set_favorite_only(true).unwrap();

    h.engine.load().await.unwrap();
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.search_prefix, "");
    assert!(!snapshot.favorite_only);
    assert_eq!(snapshot.results.len(), 3);
}

#[tokio::test]
async fn double_toggle_is_upsert_then_delete() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();

    assert!(h.engine.toggle_favorite(EntryId(NEW_YORK)).unwrap());
    assert!(!h.engine.toggle_favorite(EntryId(NEW_YORK)).unwrap());
    h.engine.flush().await.unwrap();

    assert_eq!(
        h.store.operations(),
        vec![StoreOp::Upsert(EntryId(NEW_YORK)), StoreOp::Delete(EntryId(NEW_YORK))]
    );
    assert!(!h.store.contains(EntryId(NEW_YORK)));
    assert_eq!(
        h.engine.take_store_events(),
        vec![
            StoreEvent::Saved { id: EntryId(NEW_YORK) },
            StoreEvent::Removed { id: EntryId(NEW_YORK) },
        ]
    );
    assert_eq!(h.engine.pending_writes(), 0);
}

#[tokio::test]
async fn toggle_under_favorite_filter_updates_the_view() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();
    h.engine.set_favorite_only(true).unwrap();
    h.engine.select(EntryId(PARIS)).unwrap();

    h.engine.toggle_favorite(EntryId(BUENOS_AIRES)).unwrap();
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.result_names(), vec!["Paris"]);
    assert_eq!(snapshot.selected.as_ref().map(|e| e.id), Some(EntryId(PARIS)));

    h.engine.toggle_favorite(EntryId(PARIS)).unwrap();
    let snapshot = h.engine.snapshot();
    assert!(snapshot.results.is_empty());
    assert_eq!(snapshot.selected, None);
}

#[tokio::test]
async fn unknown_ids_are_rejected() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();

    assert!(matches!(
        h.engine.toggle_favorite(EntryId(1)),
        Err(DirectoryError::EntryNotFound(EntryId(1)))
    ));
    assert!(matches!(h.engine.retry_favorite(EntryId(1)), Err(DirectoryError::EntryNotFound(_))));

    h.engine.set_search_prefix("p").unwrap();
    assert!(matches!(
        h.engine.select(EntryId(NEW_YORK)),
        Err(DirectoryError::EntryNotFound(_))
    ));
}

#[tokio::test]
async fn failed_write_is_reported_and_retried() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();
    h.store.set_fail_writes(true);

    h.engine.toggle_favorite(EntryId(NEW_YORK)).unwrap();
    h.engine.flush().await.unwrap();

    let events = h.engine.take_store_events();
    assert!(matches!(
        events.as_slice(),
        [StoreEvent::WriteFailed { id: EntryId(NEW_YORK), favorite: true, .. }]
    ));
    // No rollback of the in-memory flag.
    assert!(h.engine.snapshot().results[1].is_favorite);
    assert!(!h.store.contains(EntryId(NEW_YORK)));

    h.store.set_fail_writes(false);
    h.engine.retry_favorite(EntryId(NEW_YORK)).unwrap();
    h.engine.flush().await.unwrap();

    assert!(h.store.contains(EntryId(NEW_YORK)));
    assert_eq!(h.engine.take_store_events(), vec![StoreEvent::Saved { id: EntryId(NEW_YORK) }]);
}

#[tokio::test]
async fn fetch_failure_keeps_previous_collection() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();

    h.catalog.set_failure(Some("connection reset".to_string()));
    let err = h.engine.load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchFailed);

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.status(), LoadStatus::Failed(ErrorKind::FetchFailed));
    assert_eq!(snapshot.total, 3);

    h.catalog.set_failure(None);
    h.engine.load().await.unwrap();
    assert_eq!(h.engine.snapshot().status(), LoadStatus::Loaded(3));
}

#[tokio::test]
async fn first_load_failure_leaves_directory_empty() {
    let h = with_default_favorites();
    h.catalog.set_failure(Some("timeout".to_string()));

    assert!(h.engine.load().await.is_err());
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.status(), LoadStatus::Failed(ErrorKind::FetchFailed));
    assert_eq!(snapshot.total, 0);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn unavailable_store_loads_without_favorites() {
    let h = with_default_favorites();
    h.store.set_unavailable(true);

    h.engine.load().await.unwrap();
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.favorite_count, 0);
    assert!(matches!(
        h.engine.take_store_events().as_slice(),
        [StoreEvent::Unavailable { .. }]
    ));
}

#[tokio::test]
async fn newer_load_supersedes_slower_older_one() {
    let h = with_default_favorites();
    h.catalog.set_delay(Some(Duration::from_millis(150)));

    let slow = {
        let engine = Arc::clone(&h.engine);
        tokio::spawn(async move { engine.load().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(h.engine.snapshot().loading);

    h.catalog.set_delay(None);
    h.catalog.set_entries(vec![RawEntry::new(3117735, "Madrid", "ES", 40.4168, -3.7038)]);
    assert_eq!(h.engine.load().await.unwrap(), LoadOutcome::Applied { entries: 1 });
    assert!(!h.engine.snapshot().loading);

    assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Superseded);
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.result_names(), vec!["Madrid"]);
    assert_eq!(snapshot.status(), LoadStatus::Loaded(1));
}

#[tokio::test]
async fn newest_failure_is_cleared_by_slower_older_success() {
    let h = with_default_favorites();
    h.catalog.set_delay(Some(Duration::from_millis(150)));

    let slow = {
        let engine = Arc::clone(&h.engine);
        tokio::spawn(async move { engine.load().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    h.catalog.set_delay(None);
    h.catalog.set_failure(Some("connection reset".to_string()));
    let err = h.engine.load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchFailed);

    // The older request is still running, so the directory is still loading.
    let snapshot = h.engine.snapshot();
    assert!(snapshot.loading);
    assert_eq!(snapshot.error, Some(ErrorKind::FetchFailed));
    assert_eq!(snapshot.status(), LoadStatus::Loading);

    assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Applied { entries: 3 });
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.status(), LoadStatus::Loaded(3));
}

#[tokio::test]
async fn older_failure_does_not_mark_newer_load_failed() {
    let h = with_default_favorites();
    h.catalog.set_delay(Some(Duration::from_millis(150)));
    h.catalog.set_failure(Some("timeout".to_string()));

    let slow = {
        let engine = Arc::clone(&h.engine);
        tokio::spawn(async move { engine.load().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    h.catalog.set_delay(None);
    h.catalog.set_failure(None);
    assert_eq!(h.engine.load().await.unwrap(), LoadOutcome::Applied { entries: 3 });

    assert!(slow.await.unwrap().is_err());
    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.error, None);
    assert!(!snapshot.loading);
    assert_eq!(snapshot.status(), LoadStatus::Loaded(3));
}

#[tokio::test]
async fn toggle_during_load_survives_the_swap() {
    let h = with_default_favorites();
    h.engine.load().await.unwrap();
    h.catalog.set_delay(Some(Duration::from_millis(100)));

    let reload = {
        let engine = Arc::clone(&h.engine);
        tokio::spawn(async move { engine.load().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // The reload already read the favorite keys, without New York.
    h.engine.toggle_favorite(EntryId(NEW_YORK)).unwrap();
    reload.await.unwrap().unwrap();

    let snapshot = h.engine.snapshot();
    assert!(snapshot.results.iter().any(|e| e.id == EntryId(NEW_YORK) && e.is_favorite));
    h.engine.flush().await.unwrap();
    assert!(h.store.contains(EntryId(NEW_YORK)));
}

#[tokio::test]
async fn subscribers_see_each_publication() {
    let h = with_default_favorites();
    let mut updates = h.engine.subscribe();

    h.engine.load().await.unwrap();
    assert!(updates.has_changed().unwrap());
    let seen = updates.borrow_and_update().clone();
    assert_eq!(seen.total, 3);

    h.engine.toggle_favorite(EntryId(NEW_YORK)).unwrap();
    updates.changed().await.unwrap();
    let seen = updates.borrow_and_update().clone();
    assert!(seen.generation > 1);
    assert_eq!(seen.favorite_count, 3);
}
