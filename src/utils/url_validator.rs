//! URL 验证模块
//!
//! 短链接只接受带主机名的绝对 http(s) URL。

use url::Url;

/// 可缩短 URL 的最大长度
pub const MAX_URL_LENGTH: usize = 4096;

#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    TooLong(usize),
    UnsupportedScheme(String),
    MissingHost,
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::TooLong(len) => write!(
                f,
                "URL is {} characters long, the limit is {}",
                len, MAX_URL_LENGTH
            ),
            Self::UnsupportedScheme(scheme) => write!(
                f,
                "Unsupported scheme '{}'. Only http and https URLs can be shortened",
                scheme
            ),
            Self::MissingHost => write!(f, "URL has no host"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 验证 URL 是否为可缩短的绝对地址
///
/// 检查项目：
/// 1. 不为空（去除首尾空白后）
/// 2. 长度不超过 [`MAX_URL_LENGTH`]
/// 3. 能被解析为绝对 URL（相对路径、裸域名会被拒绝）
/// 4. scheme 为 http 或 https，且带有主机名
pub fn validate_url(url: &str) -> Result<(), UrlValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong(url.len()));
    }

    let parsed = Url::parse(url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(())
}
