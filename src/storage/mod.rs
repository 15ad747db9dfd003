//! Link persistence
//!
//! The [`Store`] trait is the only storage surface the controller and the
//! worker pool depend on. Every operation is scoped by [`User`] and must be
//! safe to call concurrently from request handlers and pool executors.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::StorageConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{FileStore, MemoryStore};
pub use models::{Link, NewLink, ShortLink, StoreStats, User, UserLink};

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a link under `code`. A duplicate code for the same user is
    /// ignored, never overwritten.
    async fn add_item(&self, user: &User, code: &str, link: Link) -> Result<()>;

    /// Fetch a link, deleted or not. Fails with `NotFound` when absent.
    async fn get_item(&self, user: &User, code: &str) -> Result<Link>;

    async fn check_exist(&self, user: &User, code: &str) -> bool;

    /// All `(code, link)` pairs of a user. Fails with `NotFound` if the user
    /// has none.
    async fn get_by_user(&self, user: &User) -> Result<Vec<(String, Link)>>;

    /// Code of a live link pointing at `url`, if the user already has one.
    async fn find_code_by_url(&self, user: &User, url: &str) -> Option<String>;

    /// Insert all rows in one step. Rows whose code is already taken are
    /// skipped; only inserted rows are returned, in input order.
    async fn bunch_save(&self, user: &User, links: Vec<NewLink>) -> Result<Vec<ShortLink>>;

    /// Mark the user's links with the given ids as deleted. Ids that are
    /// unknown or owned by someone else are skipped.
    async fn remove_items(&self, user: &User, ids: &[u64]) -> Result<()>;

    async fn count_urls_and_users(&self) -> Result<StoreStats>;

    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn Store>> {
        let store: Arc<dyn Store> = match config.file_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => Arc::new(FileStore::open(path).await?),
            None => Arc::new(MemoryStore::new()),
        };
        info!("Using storage backend: {}", store.backend_name());
        Ok(store)
    }
}
