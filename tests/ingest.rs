//! Ingestion cycle behaviour against a scripted search API and real stores.

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use tubefeed::config::IngestConfig;
use tubefeed::ingest::{IngestError, Ingestor};
use tubefeed::rotator::CredentialRotator;
use tubefeed::store::memory::InMemoryStore;
use tubefeed::store::VideoStore;

use common::{keys, raw_batch, raw_item, sqlite_store, Script, ScriptedSearch, Step};

fn rotator(n: usize, script: &Arc<Script>) -> Arc<CredentialRotator<ScriptedSearch>> {
    let script = script.clone();
    Arc::new(
        CredentialRotator::new(keys(n), move |key: &str| ScriptedSearch {
            key: key.to_string(),
            script: script.clone(),
        })
        .unwrap(),
    )
}

fn ingestor(
    rotator: Arc<CredentialRotator<ScriptedSearch>>,
    store: Arc<dyn VideoStore>,
) -> Ingestor<ScriptedSearch> {
    Ingestor::new(rotator, store, IngestConfig::default())
}

#[tokio::test]
async fn test_rate_limit_then_success_rotates_once_and_stores_once() {
    let script = Script::new(vec![Step::RateLimited, Step::Items(raw_batch(20, "Clip"))]);
    let rot = rotator(3, &script);
    let store = Arc::new(InMemoryStore::new());
    let ing = ingestor(rot.clone(), store.clone());

    let report = ing.run_cycle().await.unwrap();

    assert_eq!(report.fetched, 20);
    assert_eq!(report.upserted, 20);
    assert_eq!(report.rotations, 1);
    assert_eq!(rot.rotations(), 1);
    assert_eq!(rot.current().key, "key-1");
    assert_eq!(script.calls(), vec!["key-0", "key-1"]);
    assert_eq!(store.count().await.unwrap(), 20);
}

#[tokio::test]
async fn test_rate_limit_on_every_key_cycles_back_to_first() {
    let script = Script::new(vec![
        Step::RateLimited,
        Step::RateLimited,
        Step::RateLimited,
        Step::Items(raw_batch(1, "Late")),
    ]);
    let rot = rotator(3, &script);
    let store = Arc::new(InMemoryStore::new());

    let report = ingestor(rot.clone(), store.clone()).run_cycle().await.unwrap();

    assert_eq!(report.rotations, 3);
    assert_eq!(script.calls(), vec!["key-0", "key-1", "key-2", "key-0"]);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_rotation_cap_ends_cycle() {
    let script = Script::new(vec![
        Step::RateLimited,
        Step::RateLimited,
        Step::RateLimited,
        Step::Items(raw_batch(1, "Never")),
    ]);
    let rot = rotator(2, &script);
    let store = Arc::new(InMemoryStore::new());
    let settings = IngestConfig {
        max_rotations_per_cycle: Some(2),
        ..IngestConfig::default()
    };
    let ing = Ingestor::new(rot.clone(), store.clone(), settings);

    let err = ing.run_cycle().await.unwrap_err();

    assert!(matches!(err, IngestError::RotationsExhausted(2)));
    assert_eq!(script.calls().len(), 3);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_rate_limit_error_does_not_rotate() {
    let script = Script::new(vec![Step::ServerError]);
    let rot = rotator(2, &script);
    let store = Arc::new(InMemoryStore::new());

    let err = ingestor(rot.clone(), store.clone())
        .run_cycle()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Search(_)));
    assert_eq!(rot.rotations(), 0);
    assert_eq!(script.calls().len(), 1);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_one_bad_timestamp_discards_whole_batch() {
    let mut batch = raw_batch(20, "Clip");
    batch[19] = raw_item("v19", "Broken", "19/06/2024 10:00");
    let script = Script::new(vec![Step::Items(batch)]);
    let store = Arc::new(InMemoryStore::new());

    let err = ingestor(rotator(2, &script), store.clone())
        .run_cycle()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Normalize(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_loose_timestamp_layouts_discard_batch() {
    for loose in [
        "2024-06-01 10:00:00Z",
        "2024-06-01t10:00:00z",
        "2016-12-31T23:59:60Z",
    ] {
        let mut batch = raw_batch(5, "Clip");
        batch[2] = raw_item("v02", "Loose", loose);
        let script = Script::new(vec![Step::Items(batch)]);
        let store = Arc::new(InMemoryStore::new());

        let err = ingestor(rotator(2, &script), store.clone())
            .run_cycle()
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Normalize(_)), "{}: {}", loose, err);
        assert_eq!(store.count().await.unwrap(), 0, "{}", loose);
    }
}

#[tokio::test]
async fn test_failed_cycle_then_next_cycle_succeeds() {
    let script = Script::new(vec![Step::ServerError, Step::Items(raw_batch(5, "Clip"))]);
    let store = Arc::new(InMemoryStore::new());
    let ing = ingestor(rotator(2, &script), store.clone());

    assert!(ing.run_cycle().await.is_err());
    let report = ing.run_cycle().await.unwrap();
    assert_eq!(report.upserted, 5);
    assert_eq!(store.count().await.unwrap(), 5);
}

#[tokio::test]
async fn test_two_cycles_same_ids_last_write_wins_in_sqlite() {
    let tmp = TempDir::new().unwrap();
    let store: Arc<dyn VideoStore> = Arc::new(sqlite_store(&tmp).await);

    let mut second = raw_batch(3, "Updated");
    second[1] = raw_item("v01", "Renamed", "2030-01-01T00:00:00Z");
    let script = Script::new(vec![
        Step::Items(raw_batch(3, "Original")),
        Step::Items(second),
    ]);
    let ing = ingestor(rotator(2, &script), store.clone());

    ing.run_cycle().await.unwrap();
    ing.run_cycle().await.unwrap();

    assert_eq!(store.count().await.unwrap(), 3);
    let page = store.fetch_page(0, 10).await.unwrap();
    assert_eq!(page[0].id, "v01");
    assert_eq!(page[0].title, "Renamed");
    assert_eq!(page[0].description, "Renamed description");
    assert_eq!(
        page[0].published_at.to_rfc3339(),
        "2030-01-01T00:00:00+00:00"
    );
    assert!(page.iter().all(|v| v.title != "Original 0"
        && v.title != "Original 1"
        && v.title != "Original 2"));
}

#[tokio::test]
async fn test_run_forever_keeps_going_after_failures() {
    let script = Script::new(vec![
        Step::ServerError,
        Step::Items(vec![raw_item("bad", "Bad", "nope")]),
        Step::Items(raw_batch(4, "Clip")),
    ]);
    let store = Arc::new(InMemoryStore::new());
    let settings = IngestConfig {
        interval_secs: 1,
        ..IngestConfig::default()
    };
    let ing = Ingestor::new(rotator(2, &script), store.clone(), settings);

    let handle = tokio::spawn(async move { ing.run_forever().await });

    for _ in 0..50 {
        if store.count().await.unwrap() == 4 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }
    handle.abort();

    assert_eq!(store.count().await.unwrap(), 4);
    assert!(script.calls().len() >= 3);
}
