use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity every link is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(String);

impl User {
    /// 未建立身份时使用的匿名用户
    pub const DEFAULT: &'static str = "default";

    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for User {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for User {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for User {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A stored mapping from a code to its original URL.
///
/// `id` is assigned by the store on insert and is the handle delete
/// requests refer to. `deleted` only ever goes from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub correlation_id: String,
    pub url: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Link {
    pub fn new<T: Into<String>>(url: T) -> Self {
        Self {
            id: 0,
            correlation_id: String::new(),
            url: url.into(),
            deleted: false,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn with_correlation_id<T: Into<String>>(mut self, correlation_id: T) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn is_live(&self) -> bool {
        !self.deleted
    }
}

/// Batch insert row: a link plus the code already assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub correlation_id: String,
    pub url: String,
    pub code: String,
}

/// Create-time projection returned by batch inserts (code, not full URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub correlation_id: String,
    pub code: String,
}

/// 用户链接列表中的单项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLink {
    pub id: u64,
    pub short_url: String,
    pub original_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub users: usize,
    pub urls: usize,
}
