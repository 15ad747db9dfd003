//! Business logic shared by the HTTP handlers.

pub mod codegen;
mod controller;

pub use codegen::{CodePolicy, DeterministicCodes, RandomCodes, generate_code, policy_from_config};
pub use controller::{
    ApiResult, BatchItem, ControllerConfig, CreateOutcome, DeleteAccepted, LinkController,
    Resolved, ShortLinkView, ShortenRequest,
};
