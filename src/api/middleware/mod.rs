pub mod identity;
pub mod request_id;

pub use identity::{CurrentUser, IdentityMiddleware};
pub use request_id::{RequestId, RequestIdMiddleware};
