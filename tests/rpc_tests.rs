//! gRPC service tests
//!
//! Calls the generated `Shortener` trait directly on [`ShortenerRpc`] over an
//! in-memory store; no socket involved.

use std::sync::Arc;
use std::time::Duration;

use shortener::config::PoolConfig;
use shortener::rpc::proto::shortener_server::Shortener;
use shortener::rpc::proto::{
    BatchLink, BunchSaveRequest, CodeRequest, DeleteRequest, Empty, UrlRequest,
};
use shortener::rpc::{REAL_IP_METADATA_KEY, ShortenerRpc, USER_METADATA_KEY};
use shortener::services::{ControllerConfig, DeterministicCodes, LinkController, generate_code};
use shortener::storage::{MemoryStore, Store, User};
use shortener::worker::WorkerPool;
use tokio_util::sync::CancellationToken;
use tonic::{Code, Request};

const BASE_URL: &str = "http://short.test";

fn service(trusted_subnet: Option<&str>) -> (ShortenerRpc, WorkerPool, Arc<dyn Store>) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let pool = WorkerPool::new(store.clone(), &PoolConfig::default());
    pool.run(&CancellationToken::new());

    let controller = LinkController::new(
        store.clone(),
        pool.clone(),
        Arc::new(DeterministicCodes),
        ControllerConfig {
            base_url: BASE_URL.to_string(),
            max_attempts: 8,
            batch_code_length: 10,
        },
    );
    let rpc = ShortenerRpc::new(controller, trusted_subnet.map(|s| s.parse().unwrap()));
    (rpc, pool, store)
}

fn as_user<T>(user: &str, message: T) -> Request<T> {
    let mut request = Request::new(message);
    request
        .metadata_mut()
        .insert(USER_METADATA_KEY, user.parse().unwrap());
    request
}

fn url(url: &str) -> UrlRequest {
    UrlRequest {
        url: url.to_string(),
    }
}

#[tokio::test]
async fn test_create_then_conflict() {
    let (rpc, _pool, _store) = service(None);
    let target = "https://example.com/rpc";

    let response = rpc.create_short(as_user("userA", url(target))).await.unwrap();
    assert_eq!(
        response.metadata().get(USER_METADATA_KEY).unwrap(),
        "userA"
    );
    let short = response.into_inner().url;
    assert_eq!(short, format!("{}/{}", BASE_URL, generate_code(target)));

    let status = rpc
        .create_short(as_user("userA", url(target)))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(status.message(), short);
    assert_eq!(status.metadata().get(USER_METADATA_KEY).unwrap(), "userA");

    // another user gets an independent link
    let other = rpc.create_short(as_user("userB", url(target))).await.unwrap();
    assert_eq!(other.into_inner().url, short);
}

#[tokio::test]
async fn test_missing_metadata_uses_default_user() {
    let (rpc, _pool, store) = service(None);

    let response = rpc
        .create_short(Request::new(url("https://example.com/anon")))
        .await
        .unwrap();
    assert_eq!(
        response.metadata().get(USER_METADATA_KEY).unwrap(),
        User::DEFAULT
    );
    assert_eq!(store.get_by_user(&User::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_urls_are_invalid_argument() {
    let (rpc, _pool, store) = service(None);

    let status = rpc
        .create_short(as_user("u", url("not a url")))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let status = rpc
        .api_create_short(as_user("u", url("  ")))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "URL is empty");

    assert!(store.get_by_user(&User::new("u")).await.is_err());
}

#[tokio::test]
async fn test_api_create_short() {
    let (rpc, _pool, _store) = service(None);
    let created = rpc
        .api_create_short(as_user("u", url("https://example.com/api")))
        .await
        .unwrap()
        .into_inner();
    assert!(created.url.starts_with(BASE_URL));

    let status = rpc
        .api_create_short(as_user("u", url("https://example.com/api")))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(status.message(), created.url);
}

#[tokio::test]
async fn test_batch_keeps_order() {
    let (rpc, _pool, _store) = service(None);
    let request = BunchSaveRequest {
        links: vec![
            BatchLink {
                correlation_id: "a".to_string(),
                original_url: "https://example.com/1".to_string(),
            },
            BatchLink {
                correlation_id: "b".to_string(),
                original_url: "https://example.com/2".to_string(),
            },
        ],
    };

    let saved = rpc
        .bunch_save_json(as_user("u", request))
        .await
        .unwrap()
        .into_inner()
        .links;
    let ids: Vec<&str> = saved.iter().map(|l| l.correlation_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(saved.iter().all(|l| l.short_url.starts_with(BASE_URL)));

    let bad = BunchSaveRequest {
        links: vec![BatchLink {
            correlation_id: "x".to_string(),
            original_url: "nope".to_string(),
        }],
    };
    let status = rpc.bunch_save_json(as_user("u", bad)).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_delete_then_get_short() {
    let (rpc, pool, _store) = service(None);
    let short = rpc
        .create_short(as_user("u", url("https://example.com/gone")))
        .await
        .unwrap()
        .into_inner()
        .url;
    let code = short.rsplit('/').next().unwrap().to_string();

    let found = rpc
        .get_short(as_user("u", CodeRequest { code: code.clone() }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(found.url, "https://example.com/gone");

    let links = rpc
        .get_user_shorts(as_user("u", Empty {}))
        .await
        .unwrap()
        .into_inner()
        .links;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].short_url, short);

    rpc.delete(as_user("u", DeleteRequest { ids: vec![links[0].id] }))
        .await
        .unwrap();
    for _ in 0..200 {
        if pool.completed() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let status = rpc
        .get_short(as_user("u", CodeRequest { code: code.clone() }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::FailedPrecondition);

    let status = rpc
        .get_short(as_user("someone-else", CodeRequest { code }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn test_delete_rejections() {
    let (rpc, pool, _store) = service(None);

    let status = rpc
        .delete(as_user("u", DeleteRequest { ids: Vec::new() }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    pool.shutdown().await;
    let status = rpc
        .delete(as_user("u", DeleteRequest { ids: vec![1] }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
}

#[tokio::test]
async fn test_user_shorts_empty_for_new_user() {
    let (rpc, _pool, _store) = service(None);
    let links = rpc
        .get_user_shorts(as_user("fresh", Empty {}))
        .await
        .unwrap()
        .into_inner()
        .links;
    assert!(links.is_empty());
}

#[tokio::test]
async fn test_stats_requires_trusted_real_ip() {
    let (closed, _pool, _store) = service(None);
    let mut request = Request::new(Empty {});
    request
        .metadata_mut()
        .insert(REAL_IP_METADATA_KEY, "10.0.0.1".parse().unwrap());
    assert_eq!(
        closed.stats(request).await.unwrap_err().code(),
        Code::PermissionDenied
    );

    let (rpc, _pool, _store) = service(Some("10.0.0.0/8"));
    rpc.create_short(as_user("u1", url("https://example.com/1")))
        .await
        .unwrap();
    rpc.create_short(as_user("u2", url("https://example.com/2")))
        .await
        .unwrap();

    assert_eq!(
        rpc.stats(Request::new(Empty {})).await.unwrap_err().code(),
        Code::PermissionDenied
    );

    let mut outside = Request::new(Empty {});
    outside
        .metadata_mut()
        .insert(REAL_IP_METADATA_KEY, "192.168.1.1".parse().unwrap());
    assert_eq!(
        rpc.stats(outside).await.unwrap_err().code(),
        Code::PermissionDenied
    );

    let mut inside = Request::new(Empty {});
    inside
        .metadata_mut()
        .insert(REAL_IP_METADATA_KEY, "10.1.2.3".parse().unwrap());
    let stats = rpc.stats(inside).await.unwrap().into_inner();
    assert_eq!(stats.urls, 2);
    assert_eq!(stats.users, 2);
}

#[tokio::test]
async fn test_ping() {
    let (rpc, _pool, _store) = service(None);
    assert!(rpc.ping(Request::new(Empty {})).await.is_ok());
}
