//! Short code assignment
//!
//! `generate_code` is the positional base-62 checksum of a URL. Two URLs
//! with the same weighted sum share a code, so callers probe with an
//! increasing `attempt` and the deterministic policy salts the sum on every
//! retry.

use std::sync::Arc;

use crate::config::{CodePolicyKind, CodesConfig};
use crate::utils::{BASE62_ALPHABET, generate_random_code};

const BASE: u64 = BASE62_ALPHABET.len() as u64;

fn symbol_value(c: char) -> Option<u64> {
    if !c.is_ascii() {
        return None;
    }
    BASE62_ALPHABET
        .iter()
        .position(|&b| b == c as u8)
        .map(|p| p as u64)
}

fn weighted_sum(url: &str) -> u64 {
    url.chars()
        .enumerate()
        .filter_map(|(position, c)| {
            symbol_value(c).map(|value| {
                // 62^64 ≡ 0 (mod 2^64)，第 64 位之后的字符不再影响结果
                let weight = u32::try_from(position)
                    .map(|p| BASE.wrapping_pow(p))
                    .unwrap_or(0);
                value.wrapping_mul(weight)
            })
        })
        .fold(0u64, u64::wrapping_add)
}

/// Deterministic code of `url`, rendered as a base-10 numeral.
///
/// Characters outside the alphabet are skipped but still advance the
/// position counter.
pub fn generate_code(url: &str) -> String {
    weighted_sum(url).to_string()
}

// splitmix64 finalizer
fn mix(attempt: u32) -> u64 {
    let mut z = (attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Strategy used by the controller to pick candidate codes.
pub trait CodePolicy: Send + Sync {
    /// Candidate for single creation. `attempt` starts at zero and grows by
    /// one for each collision.
    fn assign_code(&self, url: &str, attempt: u32) -> String;

    /// Candidate for a batch row.
    fn assign_random_code(&self, length: usize) -> String {
        generate_random_code(length)
    }

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicCodes;

impl CodePolicy for DeterministicCodes {
    fn assign_code(&self, url: &str, attempt: u32) -> String {
        let sum = weighted_sum(url);
        if attempt == 0 {
            sum.to_string()
        } else {
            (sum ^ mix(attempt)).to_string()
        }
    }

    fn name(&self) -> &'static str {
        "deterministic"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RandomCodes {
    pub length: usize,
}

impl RandomCodes {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl CodePolicy for RandomCodes {
    fn assign_code(&self, _url: &str, _attempt: u32) -> String {
        generate_random_code(self.length)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Build the policy selected in `[codes]`.
pub fn policy_from_config(config: &CodesConfig) -> Arc<dyn CodePolicy> {
    match config.policy {
        CodePolicyKind::Deterministic => Arc::new(DeterministicCodes),
        CodePolicyKind::Random => Arc::new(RandomCodes::new(config.random_length)),
    }
}
