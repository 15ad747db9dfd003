//! Link controller
//!
//! Turns raw requests into stored, conflict-aware short links. All
//! collaborators are injected; the controller keeps no state of its own
//! besides its configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::codegen::CodePolicy;
use crate::config::StaticConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::{Link, NewLink, Store, StoreStats, User, UserLink};
use crate::utils::url_validator::validate_url;
use crate::worker::{Job, WorkerPool};

/// Result of a single create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new link was stored.
    Created(String),
    /// The user already has a live link for this URL; carries its short URL.
    Conflict(String),
}

impl CreateOutcome {
    pub fn short_url(&self) -> &str {
        match self {
            CreateOutcome::Created(url) | CreateOutcome::Conflict(url) => url,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// `POST /api/shorten` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ShortenRequest {
    #[serde(default)]
    pub url: String,
}

/// `POST /api/shorten` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResult {
    pub result: String,
}

/// One row of a batch create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// One row of a batch create response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLinkView {
    pub correlation_id: String,
    pub short_url: String,
}

/// Deletion was queued; it runs later on the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteAccepted;

/// Outcome of looking a code up for redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Found(String),
    Gone,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub base_url: String,
    pub max_attempts: u32,
    pub batch_code_length: usize,
}

impl ControllerConfig {
    pub fn from_static(config: &StaticConfig) -> Self {
        Self {
            base_url: config.shortener.base_url.clone(),
            max_attempts: config.codes.max_attempts,
            batch_code_length: config.codes.batch_code_length,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_static(&StaticConfig::default())
    }
}

#[derive(Clone)]
pub struct LinkController {
    store: Arc<dyn Store>,
    pool: WorkerPool,
    policy: Arc<dyn CodePolicy>,
    config: ControllerConfig,
}

impl LinkController {
    pub fn new(
        store: Arc<dyn Store>,
        pool: WorkerPool,
        policy: Arc<dyn CodePolicy>,
        mut config: ControllerConfig,
    ) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            store,
            pool,
            policy,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.config.base_url, code)
    }

    /// Create a short link for `url`, or report the one the user already has.
    pub async fn create_short(&self, user: &User, url: &str) -> Result<CreateOutcome> {
        let url = url.trim();
        validate_url(url).map_err(|e| ShortenerError::invalid_input(e.to_string()))?;

        if let Some(code) = self.store.find_code_by_url(user, url).await {
            debug!("URL already shortened for user {}: {}", user, code);
            return Ok(CreateOutcome::Conflict(self.short_url(&code)));
        }

        for attempt in 0..self.config.max_attempts {
            let code = self.policy.assign_code(url, attempt);
            if !self.store.check_exist(user, &code).await {
                let link = Link::new(url);
                self.store.add_item(user, &code, link).await?;
                info!("Created short link {} for user {}", code, user);
                return Ok(CreateOutcome::Created(self.short_url(&code)));
            }

            match self.store.get_item(user, &code).await {
                Ok(existing) if existing.is_live() && existing.url == url => {
                    return Ok(CreateOutcome::Conflict(self.short_url(&code)));
                }
                Ok(_) | Err(ShortenerError::NotFound(_)) => {
                    debug!("Code {} collides (attempt {}), probing again", code, attempt);
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            "No free code for user {} after {} attempts",
            user, self.config.max_attempts
        );
        Err(ShortenerError::code_space_exhausted(format!(
            "no free code after {} attempts",
            self.config.max_attempts
        )))
    }

    /// JSON flavour of [`LinkController::create_short`]: body is `{"url": ...}`.
    pub async fn api_create_short(&self, user: &User, raw_json: &[u8]) -> Result<CreateOutcome> {
        let request: ShortenRequest = serde_json::from_slice(raw_json)
            .map_err(|e| ShortenerError::malformed_request(format!("JSON is incorrect: {}", e)))?;
        if request.url.trim().is_empty() {
            return Err(ShortenerError::malformed_request("URL is empty"));
        }
        self.create_short(user, &request.url).await
    }

    /// Store a batch under random codes. Rows whose code is already taken are
    /// skipped; the response only lists stored rows, in input order.
    pub async fn bunch_save_json(
        &self,
        user: &User,
        items: Vec<BatchItem>,
    ) -> Result<Vec<ShortLinkView>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        for item in &items {
            validate_url(&item.original_url).map_err(|e| {
                ShortenerError::invalid_input(format!(
                    "correlation_id {}: {}",
                    item.correlation_id, e
                ))
            })?;
        }

        let rows: Vec<NewLink> = items
            .into_iter()
            .map(|item| NewLink {
                correlation_id: item.correlation_id,
                url: item.original_url.trim().to_string(),
                code: self.policy.assign_random_code(self.config.batch_code_length),
            })
            .collect();
        let requested = rows.len();

        let saved = self.store.bunch_save(user, rows).await.map_err(|e| {
            warn!("Batch save failed for user {}: {}", user, e);
            ShortenerError::batch_write_failed(e.message().to_string())
        })?;

        if saved.len() < requested {
            info!(
                "Batch for user {}: {} of {} rows stored",
                user,
                saved.len(),
                requested
            );
        }

        Ok(saved
            .into_iter()
            .map(|link| ShortLinkView {
                short_url: self.short_url(&link.code),
                correlation_id: link.correlation_id,
            })
            .collect())
    }

    /// Queue a soft-delete of `ids`. Returns as soon as the job is queued.
    pub async fn delete(&self, user: &User, ids: Vec<u64>) -> Result<DeleteAccepted> {
        if ids.is_empty() {
            return Err(ShortenerError::empty_request("No ids"));
        }
        debug!("Queueing deletion of {} links for user {}", ids.len(), user);
        self.pool
            .push(Job::DeleteBatch {
                user: user.clone(),
                ids,
            })
            .await?;
        Ok(DeleteAccepted)
    }

    /// Look up `code` in the user's scope for redirection.
    pub async fn resolve(&self, user: &User, code: &str) -> Result<Resolved> {
        let link = self.store.get_item(user, code).await?;
        if link.deleted {
            return Ok(Resolved::Gone);
        }
        Ok(Resolved::Found(link.url))
    }

    /// All links of a user, deleted ones included, oldest first.
    pub async fn user_links(&self, user: &User) -> Result<Vec<UserLink>> {
        let links = self.store.get_by_user(user).await?;
        Ok(links
            .into_iter()
            .map(|(code, link)| UserLink {
                id: link.id,
                short_url: self.short_url(&code),
                original_url: link.url,
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.count_urls_and_users().await
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}
