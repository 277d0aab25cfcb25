use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable that supplies a token directly, bypassing the store.
pub const TOKEN_ENV: &str = "CALENDAR_ASSISTANT_TOKEN";

/// A bearer token for the calendar provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Where tokens are kept between runs, one per profile.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The stored token, or `None` when absent or expired.
    async fn get(&self, profile: &str) -> Result<Option<AccessToken>>;
    async fn set(&self, profile: &str, token: &AccessToken) -> Result<()>;
    async fn delete(&self, profile: &str) -> Result<()>;
}

pub fn token_key(profile: &str) -> String {
    format!("token:{profile}")
}

/// The token for `profile`: `$CALENDAR_ASSISTANT_TOKEN` when set, else the
/// store's entry.
pub async fn resolve_access_token(store: &dyn TokenStore, profile: &str) -> Result<AccessToken> {
    if let Some(token) = std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()) {
        tracing::debug!("using access token from {TOKEN_ENV}");
        return Ok(AccessToken::new(token.trim()));
    }
    lookup(store, profile).await
}

async fn lookup(store: &dyn TokenStore, profile: &str) -> Result<AccessToken> {
    match store.get(profile).await? {
        Some(token) if !token.is_expired() => Ok(token),
        Some(_) => Err(Error::Config(format!(
            "access token for profile {profile:?} has expired; run `calendar-assistant authorize {profile} --token <TOKEN>`"
        ))),
        None => Err(Error::Config(format!(
            "no access token for profile {profile:?}; run `calendar-assistant authorize {profile} --token <TOKEN>`"
        ))),
    }
}
