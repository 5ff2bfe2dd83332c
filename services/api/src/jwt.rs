//! JWT service for session tokens
//!
//! Tokens are signed with HS256 using a shared secret and carry the user's id
//! and name. Revoked tokens are blacklisted in Redis until they would have
//! expired anyway.

use anyhow::Result;
use common::{cache::RedisPool, models::User};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: String,
    /// Token lifetime in seconds (default: 7 days)
    pub expiry: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC signing secret (required)
    /// - `JWT_EXPIRY`: Token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let expiry = std::env::var("JWT_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig { secret, expiry })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub username: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

impl Claims {
    /// Seconds until the token expires, zero once it has
    pub fn remaining_lifetime(&self) -> Result<u64> {
        Ok(self.exp.saturating_sub(now()?))
    }
}

fn now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            expiry: config.expiry,
        }
    }

    /// Issue a session token for a user
    pub fn generate_token(&self, user: &User) -> Result<String> {
        self.encode_claims(user.id, &user.username, now()?)
    }

    fn encode_claims(&self, user_id: Uuid, username: &str, issued_at: u64) -> Result<String> {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: issued_at,
            exp: issued_at + self.expiry,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Check if a token is blacklisted in Redis
    pub async fn is_token_blacklisted(&self, redis_pool: &RedisPool, token: &str) -> Result<bool> {
        let key = format!("blacklisted_token:{}", token);
        let result = redis_pool.get(&key).await?;
        Ok(result.is_some())
    }

    /// Blacklist a token in Redis for `expiry` seconds
    pub async fn blacklist_token(
        &self,
        redis_pool: &RedisPool,
        token: &str,
        expiry: u64,
    ) -> Result<()> {
        if expiry == 0 {
            return Ok(());
        }
        let key = format!("blacklisted_token:{}", token);
        redis_pool.set(&key, "1", Some(expiry)).await?;
        Ok(())
    }

    /// Token lifetime in seconds
    pub fn expiry(&self) -> u64 {
        self.expiry
    }
}
