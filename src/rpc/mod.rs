//! gRPC transport
//!
//! The same operations as the HTTP routes, served with tonic. Identity comes
//! from the `user_id` request metadata instead of a signed cookie.

mod service;
mod status;

pub use service::{REAL_IP_METADATA_KEY, ShortenerRpc, USER_METADATA_KEY};

/// Generated messages, server trait and client.
pub mod proto {
    tonic::include_proto!("shortener");
}
