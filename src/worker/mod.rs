//! Deferred mutations
//!
//! Requests that must not wait for storage (deletes) are turned into a
//! [`Job`] and queued on the [`WorkerPool`].

mod job;
mod pool;

pub use job::Job;
pub use pool::WorkerPool;
