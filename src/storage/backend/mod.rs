//! Store backends
//!
//! - [`MemoryStore`]: process-local, sharded by user
//! - [`FileStore`]: memory store persisted as a JSON snapshot after each write

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::storage::{Link, User};

/// 持久化快照中的单条记录
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SerializableLink {
    pub user: User,
    pub code: String,
    #[serde(flatten)]
    pub link: Link,
}
