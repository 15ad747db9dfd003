use anyhow::Context;

use crate::storage::{Store, User};

/// Unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Soft-delete the given link ids owned by `user`.
    DeleteBatch { user: User, ids: Vec<u64> },
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::DeleteBatch { .. } => "delete_batch",
        }
    }

    pub async fn execute(&self, store: &dyn Store) -> anyhow::Result<()> {
        match self {
            Job::DeleteBatch { user, ids } => store
                .remove_items(user, ids)
                .await
                .with_context(|| {
                    format!("Failed to delete {} links for user {}", ids.len(), user)
                }),
        }
    }
}
