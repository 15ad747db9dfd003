use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{MemoryStore, SerializableLink};
use crate::errors::{Result, ShortenerError};
use crate::storage::{Link, NewLink, ShortLink, Store, StoreStats, User};

/// JSON-file backed store.
///
/// Reads go straight to the in-memory copy; every mutation rewrites the
/// snapshot file before returning and is undone if that write fails.
pub struct FileStore {
    inner: MemoryStore,
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let records = Self::load_from_file(&file_path).await?;
        info!(
            "Loaded {} links from {}",
            records.len(),
            file_path.display()
        );

        Ok(Self {
            inner: MemoryStore::from_records(records),
            file_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn load_from_file(path: &Path) -> Result<Vec<SerializableLink>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Link file not found, starting with empty storage");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(ShortenerError::file_operation(format!(
                    "Failed to read link file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse link file: {}", e);
            ShortenerError::serialization(format!("Failed to parse link file: {}", e))
        })
    }

    /// Rewrite the snapshot from the in-memory copy. Callers hold
    /// `write_lock` across the mutation and the save.
    async fn save_to_file(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.inner.records()).map_err(|e| {
            ShortenerError::store_failure(format!("Failed to serialize links: {}", e))
        })?;
        let tmp_path = self.file_path.with_extension("tmp");

        let write = async {
            if let Some(parent) = self.file_path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&tmp_path, json).await?;
            tokio::fs::rename(&tmp_path, &self.file_path).await
        };
        write.await.map_err(|e: std::io::Error| {
            error!("Failed to save link file {}: {}", self.file_path.display(), e);
            ShortenerError::store_failure(format!(
                "Failed to save link file {}: {}",
                self.file_path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl Store for FileStore {
    async fn add_item(&self, user: &User, code: &str, link: Link) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !self.inner.insert_link(user, code, link) {
            return Ok(());
        }
        if let Err(e) = self.save_to_file().await {
            self.inner.forget_codes(user, [code]);
            return Err(e);
        }
        Ok(())
    }

    async fn get_item(&self, user: &User, code: &str) -> Result<Link> {
        self.inner.get_item(user, code).await
    }

    async fn check_exist(&self, user: &User, code: &str) -> bool {
        self.inner.check_exist(user, code).await
    }

    async fn get_by_user(&self, user: &User) -> Result<Vec<(String, Link)>> {
        self.inner.get_by_user(user).await
    }

    async fn find_code_by_url(&self, user: &User, url: &str) -> Option<String> {
        self.inner.find_code_by_url(user, url).await
    }

    async fn bunch_save(&self, user: &User, links: Vec<NewLink>) -> Result<Vec<ShortLink>> {
        let _guard = self.write_lock.lock().await;
        let saved = self.inner.bunch_save(user, links).await?;
        if saved.is_empty() {
            return Ok(saved);
        }
        if let Err(e) = self.save_to_file().await {
            self.inner
                .forget_codes(user, saved.iter().map(|link| link.code.as_str()));
            return Err(e);
        }
        Ok(saved)
    }

    async fn remove_items(&self, user: &User, ids: &[u64]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let marked = self.inner.mark_deleted(user, ids);
        if marked.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.save_to_file().await {
            self.inner.unmark_deleted(user, &marked);
            return Err(e);
        }
        Ok(())
    }

    async fn count_urls_and_users(&self) -> Result<StoreStats> {
        self.inner.count_urls_and_users().await
    }

    async fn ping(&self) -> Result<()> {
        match tokio::fs::metadata(&self.file_path).await {
            Ok(_) => Ok(()),
            // 尚未写入过任何链接
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShortenerError::store_failure(format!(
                "Link file {} is not accessible: {}",
                self.file_path.display(),
                e
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
