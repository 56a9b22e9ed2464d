//! Access tokens for the realtime endpoint
//!
//! Obtaining a credential is the host application's business; the connection
//! only needs a bearer token and the instant it stops being valid.
use crate::error::TokenError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

#[derive(Debug)]
pub struct AccessToken {
    pub secret: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { secret, expires_at }
    }

    /// Time left before expiry, zero if already expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
pub trait TokenSupplier: Send + Sync {
    /// `TokenError::Rejected` ends the connection with `AuthRequired`;
    /// `TokenError::Unavailable` is retried with backoff.
    async fn get_token(&self) -> Result<AccessToken, TokenError>;
}

/// Fixed token whose expiry slides forward by `ttl` on every call
#[derive(Debug)]
pub struct StaticTokenSupplier {
    token: SecretString,
    ttl: Duration,
}

impl StaticTokenSupplier {
    pub fn new(token: SecretString, ttl: Duration) -> Self {
        Self { token, ttl }
    }
}

#[async_trait]
impl TokenSupplier for StaticTokenSupplier {
    async fn get_token(&self) -> Result<AccessToken, TokenError> {
        if self.token.expose_secret().is_empty() {
            return Err(TokenError::Rejected("empty token".to_string()));
        }

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| TokenError::Unavailable(e.to_string()))?;

        Ok(AccessToken::new(
            SecretString::from(self.token.expose_secret().to_string()),
            Utc::now() + ttl,
        ))
    }
}
