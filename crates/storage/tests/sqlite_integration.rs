use guessr_core::model::{
    AttemptOutcome, CatalogSnapshot, CategoryEntry, CategoryId, ItemId, Mode, SessionConfig,
    StatsSnapshot,
};
use storage::records::USER_STATS_KEY;
use storage::repository::{
    CatalogSnapshotRepository, KeyValueStore, SettingsRepository, SnapshotState, StatsRepository,
    Storage,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_kv_put_overwrites_and_remove_is_idempotent() {
    let repo = connect("memdb_kv").await;

    assert_eq!(repo.get("k").await.unwrap(), None);
    repo.put("k", "one").await.unwrap();
    repo.put("k", "two").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("two"));

    repo.remove("k").await.unwrap();
    repo.remove("k").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_can_run_twice() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.put("k", "v").await.unwrap();
    assert!(repo.get("k").await.unwrap().is_some());
}

#[tokio::test]
async fn sqlite_roundtrip_persists_stats_catalog_and_settings() {
    let repo = connect("memdb_roundtrip").await;

    let mut stats = StatsSnapshot::new();
    stats.record(ItemId::new(25), Some(CategoryId::new(1)), AttemptOutcome::Success);
    stats.record(ItemId::new(25), Some(CategoryId::new(1)), AttemptOutcome::Pass);
    stats.record(ItemId::new(152), None, AttemptOutcome::Failure);
    repo.save_stats(&stats).await.unwrap();
    assert_eq!(repo.load_stats().await.unwrap(), stats);

    let snapshot = CatalogSnapshot::new(vec![
        CategoryEntry {
            category: CategoryId::new(1),
            ids: vec![ItemId::new(1), ItemId::new(25)],
        },
        CategoryEntry {
            category: CategoryId::new(2),
            ids: vec![ItemId::new(152)],
        },
    ]);
    repo.save_snapshot(&snapshot).await.unwrap();
    assert_eq!(
        repo.load_snapshot().await.unwrap(),
        SnapshotState::Valid(snapshot)
    );

    let config = SessionConfig::new([1, 2], 30, 2, Mode::Progressive).unwrap();
    repo.save_settings(&config).await.unwrap();
    assert_eq!(repo.load_settings().await.unwrap(), config);
}

#[tokio::test]
async fn sqlite_corrupt_stats_read_as_empty() {
    let repo = connect("memdb_corrupt_stats").await;
    repo.put(USER_STATS_KEY, "not json").await.unwrap();
    assert!(repo.load_stats().await.unwrap().is_empty());
}

#[tokio::test]
async fn storage_sqlite_builds_shared_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    assert_eq!(
        storage.catalog.load_snapshot().await.unwrap(),
        SnapshotState::Absent
    );
    assert_eq!(
        storage.settings.load_settings().await.unwrap(),
        SessionConfig::default()
    );
}
