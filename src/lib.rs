//! Shortener - a multi-tenant URL shortener service
//!
//! Every user owns an independent code namespace. Single links get a code
//! from the configured [`services::CodePolicy`], batches get random codes,
//! and deletions are deferred to a bounded [`worker::WorkerPool`].
//!
//! # Architecture
//! - `services`: code assignment and the link controller
//! - `storage`: the `Store` trait with memory and JSON-file backends
//! - `worker`: typed deferred jobs and the pool that runs them
//! - `api`: HTTP handlers and middleware (actix-web)
//! - `rpc`: the same operations over gRPC (tonic)
//! - `config`: static configuration (file, environment, flags)
//! - `runtime`: startup wiring, server mode and shutdown
//! - `system`: logging

pub mod api;
pub mod config;
pub mod errors;
pub mod rpc;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
pub mod worker;
