//! Signed identity tokens
//!
//! The identity cookie carries an HS256 JWT whose `sub` claim is the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::IdentityConfig;
use crate::storage::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// JWT Service for issuing and validating identity tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_days: u64,
}

impl JwtService {
    pub fn new(secret: &str, token_ttl_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_days,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        // 未配置密钥时随机生成，重启后旧 Cookie 全部失效
        let secret = if config.secret.is_empty() {
            warn!("Identity secret not configured, generating a random one");
            crate::utils::generate_secure_token(32)
        } else {
            config.secret.clone()
        };
        Self::new(&secret, config.token_ttl_days)
    }

    pub fn token_ttl_days(&self) -> u64 {
        self.token_ttl_days
    }

    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = IdentityClaims {
            sub: user.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.token_ttl_days as i64)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Validate a token and return the user it identifies.
    pub fn validate(&self, token: &str) -> Result<User, jsonwebtoken::errors::Error> {
        let token_data = decode::<IdentityClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.sub.is_empty() {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidSubject,
            ));
        }

        Ok(User::new(token_data.claims.sub))
    }
}
