use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

use super::SerializableLink;
use crate::errors::{Result, ShortenerError};
use crate::storage::{Link, NewLink, ShortLink, Store, StoreStats, User};

/// In-memory store sharded by user.
///
/// All writes for one user go through that user's map entry, so a
/// `bunch_save` call is applied atomically with respect to other writers of
/// the same user.
pub struct MemoryStore {
    users: DashMap<User, HashMap<String, Link>>,
    next_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Rebuild a store from snapshot records. Later duplicates of a
    /// (user, code) pair are dropped.
    pub fn from_records(records: Vec<SerializableLink>) -> Self {
        let store = Self::new();
        let mut max_id = 0;
        for record in records {
            max_id = max_id.max(record.link.id);
            store
                .users
                .entry(record.user)
                .or_default()
                .entry(record.code)
                .or_insert(record.link);
        }
        store.next_id.store(max_id + 1, Ordering::Relaxed);
        store
    }

    /// Flatten the store into snapshot records ordered by id.
    pub fn records(&self) -> Vec<SerializableLink> {
        let mut records: Vec<SerializableLink> = self
            .users
            .iter()
            .flat_map(|entry| {
                let user = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .map(|(code, link)| SerializableLink {
                        user: user.clone(),
                        code: code.clone(),
                        link: link.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        records.sort_by_key(|r| r.link.id);
        records
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert unless the code is taken. Returns whether the link was stored.
    pub(super) fn insert_link(&self, user: &User, code: &str, mut link: Link) -> bool {
        let mut links = self.users.entry(user.clone()).or_default();
        if links.contains_key(code) {
            debug!("MemoryStore: code '{}' already taken for {}, ignoring", code, user);
            return false;
        }
        link.id = self.allocate_id();
        trace!("MemoryStore: insert {}/{} as id {}", user, code, link.id);
        links.insert(code.to_string(), link);
        true
    }

    /// Soft-delete the user's links among `ids`. Returns the ids that were
    /// live before the call.
    pub(super) fn mark_deleted(&self, user: &User, ids: &[u64]) -> Vec<u64> {
        let Some(mut links) = self.users.get_mut(user) else {
            debug!("MemoryStore: remove_items for unknown user {}", user);
            return Vec::new();
        };

        let wanted: HashSet<u64> = ids.iter().copied().collect();
        let mut owned = 0;
        let mut marked = Vec::new();
        for link in links.values_mut().filter(|l| wanted.contains(&l.id)) {
            owned += 1;
            if !link.deleted {
                link.deleted = true;
                marked.push(link.id);
            }
        }

        if owned < wanted.len() {
            debug!(
                "MemoryStore: {} of {} ids not owned by {}",
                wanted.len() - owned,
                wanted.len(),
                user
            );
        }
        marked
    }

    /// Undo inserts that could not be persisted.
    pub(super) fn forget_codes<'a, I>(&self, user: &User, codes: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some(mut links) = self.users.get_mut(user) {
            for code in codes {
                links.remove(code);
            }
        }
        self.users.remove_if(user, |_, links| links.is_empty());
    }

    /// Undo a soft-delete that could not be persisted.
    pub(super) fn unmark_deleted(&self, user: &User, ids: &[u64]) {
        let Some(mut links) = self.users.get_mut(user) else {
            return;
        };
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        for link in links.values_mut().filter(|l| wanted.contains(&l.id)) {
            link.deleted = false;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn add_item(&self, user: &User, code: &str, link: Link) -> Result<()> {
        self.insert_link(user, code, link);
        Ok(())
    }

    async fn get_item(&self, user: &User, code: &str) -> Result<Link> {
        self.users
            .get(user)
            .and_then(|links| links.get(code).cloned())
            .ok_or_else(|| ShortenerError::not_found(format!("Link '{}' not found", code)))
    }

    async fn check_exist(&self, user: &User, code: &str) -> bool {
        self.users
            .get(user)
            .is_some_and(|links| links.contains_key(code))
    }

    async fn get_by_user(&self, user: &User) -> Result<Vec<(String, Link)>> {
        let mut links: Vec<(String, Link)> = self
            .users
            .get(user)
            .map(|links| {
                links
                    .iter()
                    .map(|(code, link)| (code.clone(), link.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if links.is_empty() {
            return Err(ShortenerError::not_found(format!(
                "No links for user '{}'",
                user
            )));
        }
        links.sort_by_key(|(_, link)| link.id);
        Ok(links)
    }

    async fn find_code_by_url(&self, user: &User, url: &str) -> Option<String> {
        let links = self.users.get(user)?;
        links
            .iter()
            .filter(|(_, link)| link.is_live() && link.url == url)
            .min_by_key(|(_, link)| link.id)
            .map(|(code, _)| code.clone())
    }

    async fn bunch_save(&self, user: &User, links: Vec<NewLink>) -> Result<Vec<ShortLink>> {
        let mut saved = Vec::with_capacity(links.len());
        let mut existing = self.users.entry(user.clone()).or_default();

        for row in links {
            if existing.contains_key(&row.code) {
                debug!(
                    "MemoryStore: batch row '{}' skipped, code '{}' taken",
                    row.correlation_id, row.code
                );
                continue;
            }
            let link = Link {
                id: self.allocate_id(),
                ..Link::new(row.url).with_correlation_id(row.correlation_id.clone())
            };
            existing.insert(row.code.clone(), link);
            saved.push(ShortLink {
                correlation_id: row.correlation_id,
                code: row.code,
            });
        }

        Ok(saved)
    }

    async fn remove_items(&self, user: &User, ids: &[u64]) -> Result<()> {
        self.mark_deleted(user, ids);
        Ok(())
    }

    async fn count_urls_and_users(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();
        for entry in self.users.iter().filter(|e| !e.value().is_empty()) {
            stats.users += 1;
            stats.urls += entry.value().len();
        }
        Ok(stats)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
