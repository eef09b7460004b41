use std::sync::Arc;

use patrol_core::model::{ItemPatch, ProgressRecord};
use patrol_core::time::fixed_now;
use storage::repository::KeyValueStore;
use storage::sqlite::SqliteRepository;
use storage::{StorageCodec, keys};

#[tokio::test]
async fn sqlite_kv_roundtrip_and_overwrite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get(keys::SESSION).await.unwrap(), None);

    repo.set(keys::SESSION, "first").await.unwrap();
    repo.set(keys::SESSION, "second").await.unwrap();
    assert_eq!(
        repo.get(keys::SESSION).await.unwrap().as_deref(),
        Some("second")
    );

    repo.remove(keys::SESSION).await.unwrap();
    assert_eq!(repo.get(keys::SESSION).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.set(keys::LEDGER, "{}").await.unwrap();
    repo.migrate().await.expect("second migrate");

    assert_eq!(repo.get(keys::LEDGER).await.unwrap().as_deref(), Some("{}"));
}

#[tokio::test]
async fn codec_persists_progress_map_through_sqlite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_codec?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    let codec = StorageCodec::new(Arc::new(repo));

    let mut record = ProgressRecord::default();
    record.apply_item_patch("a-1", &ItemPatch::completed(true), fixed_now());
    let mut results = std::collections::BTreeMap::new();
    results.insert("A__2024-05-20__line-a".to_string(), record.clone());

    codec.write_json(keys::RESULTS, &results).await;

    let loaded: std::collections::BTreeMap<String, ProgressRecord> =
        codec.read_json(keys::RESULTS).await.expect("stored results");
    assert_eq!(loaded.get("A__2024-05-20__line-a"), Some(&record));
}
