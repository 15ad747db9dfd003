//! Static configuration
//!
//! Precedence (lowest to highest): built-in defaults, `config.toml`,
//! `SHORTENER__*` environment variables, command-line flags and their
//! legacy environment aliases (`SERVER_ADDRESS`, `BASE_URL`, ...).

pub mod args;
mod structs;

pub use args::CliArgs;
pub use structs::*;
