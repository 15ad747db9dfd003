//! Store backend tests
//!
//! Memory behaviour is covered inline; these exercise the JSON snapshot
//! of `FileStore` and the factory.

use std::sync::Arc;

use shortener::config::{PoolConfig, StorageConfig};
use shortener::errors::ShortenerError;
use shortener::services::{ControllerConfig, DeterministicCodes, LinkController};
use shortener::storage::{FileStore, Link, NewLink, StorageFactory, Store, User};
use shortener::worker::WorkerPool;
use tempfile::TempDir;

fn user() -> User {
    User::new("file-user")
}

#[tokio::test]
async fn test_missing_file_opens_empty() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("links.json")).await.unwrap();

    let stats = store.count_urls_and_users().await.unwrap();
    assert_eq!(stats.urls, 0);
    assert!(store.ping().await.is_ok());
    assert_eq!(store.backend_name(), "file");
}

#[tokio::test]
async fn test_blank_file_opens_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    std::fs::write(&path, "  \n").unwrap();

    let store = FileStore::open(&path).await.unwrap();
    assert!(matches!(
        store.get_by_user(&user()).await,
        Err(ShortenerError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_corrupt_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        FileStore::open(&path).await,
        Err(ShortenerError::Serialization(_))
    ));
}

#[tokio::test]
async fn test_links_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("links.json");

    {
        let store = FileStore::open(&path).await.unwrap();
        store
            .add_item(&user(), "abc", Link::new("https://example.com/1"))
            .await
            .unwrap();
        let saved = store
            .bunch_save(
                &user(),
                vec![NewLink {
                    correlation_id: "c1".to_string(),
                    url: "https://example.com/2".to_string(),
                    code: "xyz".to_string(),
                }],
            )
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);

        let id = store.get_item(&user(), "abc").await.unwrap().id;
        store.remove_items(&user(), &[id]).await.unwrap();
    }

    let reopened = FileStore::open(&path).await.unwrap();
    let deleted = reopened.get_item(&user(), "abc").await.unwrap();
    assert!(deleted.deleted);
    let batch = reopened.get_item(&user(), "xyz").await.unwrap();
    assert_eq!(batch.correlation_id, "c1");
    assert!(!batch.deleted);

    // ids keep growing after a reload
    reopened
        .add_item(&user(), "new", Link::new("https://example.com/3"))
        .await
        .unwrap();
    let fresh = reopened.get_item(&user(), "new").await.unwrap();
    assert!(fresh.id > batch.id);
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_duplicate_code_is_not_overwritten_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");

    let store = FileStore::open(&path).await.unwrap();
    store
        .add_item(&user(), "abc", Link::new("https://first.example/"))
        .await
        .unwrap();
    store
        .add_item(&user(), "abc", Link::new("https://second.example/"))
        .await
        .unwrap();

    let reopened = FileStore::open(&path).await.unwrap();
    assert_eq!(
        reopened.get_item(&user(), "abc").await.unwrap().url,
        "https://first.example/"
    );
}

/// Occupy the temp snapshot path with a directory so every save fails.
fn block_snapshot_writes(path: &std::path::Path) {
    std::fs::create_dir(path.with_extension("tmp")).unwrap();
}

fn unblock_snapshot_writes(path: &std::path::Path) {
    std::fs::remove_dir(path.with_extension("tmp")).unwrap();
}

#[tokio::test]
async fn test_failed_save_leaves_no_link_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    let store = FileStore::open(&path).await.unwrap();
    block_snapshot_writes(&path);

    let result = store
        .add_item(&user(), "abc", Link::new("https://example.com/1"))
        .await;
    assert!(matches!(result, Err(ShortenerError::StoreFailure(_))));
    assert!(!store.check_exist(&user(), "abc").await);
    assert!(
        store
            .find_code_by_url(&user(), "https://example.com/1")
            .await
            .is_none()
    );

    let batch = store
        .bunch_save(
            &user(),
            vec![
                NewLink {
                    correlation_id: "c1".to_string(),
                    url: "https://example.com/2".to_string(),
                    code: "b1".to_string(),
                },
                NewLink {
                    correlation_id: "c2".to_string(),
                    url: "https://example.com/3".to_string(),
                    code: "b2".to_string(),
                },
            ],
        )
        .await;
    assert!(matches!(batch, Err(ShortenerError::StoreFailure(_))));
    assert!(!store.check_exist(&user(), "b1").await);
    assert!(!store.check_exist(&user(), "b2").await);
    assert_eq!(store.count_urls_and_users().await.unwrap().urls, 0);

    // 恢复写入后不会带出之前失败的记录
    unblock_snapshot_writes(&path);
    store
        .add_item(&user(), "ok", Link::new("https://example.com/4"))
        .await
        .unwrap();
    let reopened = FileStore::open(&path).await.unwrap();
    let links = reopened.get_by_user(&user()).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].0, "ok");
}

#[tokio::test]
async fn test_failed_save_keeps_link_live() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    let store = FileStore::open(&path).await.unwrap();
    store
        .add_item(&user(), "abc", Link::new("https://example.com/1"))
        .await
        .unwrap();
    let id = store.get_item(&user(), "abc").await.unwrap().id;

    block_snapshot_writes(&path);
    let result = store.remove_items(&user(), &[id]).await;
    assert!(matches!(result, Err(ShortenerError::StoreFailure(_))));
    assert!(store.get_item(&user(), "abc").await.unwrap().is_live());

    unblock_snapshot_writes(&path);
    store.remove_items(&user(), &[id]).await.unwrap();
    let reopened = FileStore::open(&path).await.unwrap();
    assert!(reopened.get_item(&user(), "abc").await.unwrap().deleted);
}

#[tokio::test]
async fn test_failed_create_is_not_reported_as_conflict() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    let store: Arc<dyn Store> = Arc::new(FileStore::open(&path).await.unwrap());
    let pool = WorkerPool::new(store.clone(), &PoolConfig::default());
    let controller = LinkController::new(
        store.clone(),
        pool,
        Arc::new(DeterministicCodes),
        ControllerConfig::default(),
    );
    block_snapshot_writes(&path);

    for _ in 0..2 {
        let result = controller
            .create_short(&user(), "https://example.com/retry")
            .await;
        assert!(matches!(result, Err(ShortenerError::StoreFailure(_))));
    }
    assert!(matches!(
        store.get_by_user(&user()).await,
        Err(ShortenerError::NotFound(_))
    ));

    unblock_snapshot_writes(&path);
    let created = controller
        .create_short(&user(), "https://example.com/retry")
        .await
        .unwrap();
    assert!(created.is_created());
}

#[tokio::test]
async fn test_factory_selects_backend() {
    let memory = StorageFactory::create(&StorageConfig::default()).await.unwrap();
    assert_eq!(memory.backend_name(), "memory");

    let blank = StorageFactory::create(&StorageConfig {
        file_path: Some(String::new()),
    })
    .await
    .unwrap();
    assert_eq!(blank.backend_name(), "memory");

    let dir = TempDir::new().unwrap();
    let file = StorageFactory::create(&StorageConfig {
        file_path: Some(dir.path().join("links.json").to_string_lossy().into_owned()),
    })
    .await
    .unwrap();
    assert_eq!(file.backend_name(), "file");
}
