use async_trait::async_trait;
use istore_shared::Masked;

use crate::CoreResult;

/// Short-lived login state: one-time magic-link tokens, revoked sessions and
/// request counters.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a fresh one-time token for `email` and returns it.
    async fn issue_login_token(&self, email: &str, ttl_seconds: u64) -> CoreResult<String>;

    /// Returns the email the token was issued for and invalidates it.
    async fn consume_login_token(&self, token: &str) -> CoreResult<Option<String>>;

    async fn revoke_session(&self, session_id: &str, ttl_seconds: u64) -> CoreResult<()>;

    async fn is_revoked(&self, session_id: &str) -> CoreResult<bool>;

    /// Counts a hit on `key`; `false` once more than `limit` hits fall in the window.
    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> CoreResult<bool>;
}

/// Sends a magic link to its owner.
#[async_trait]
pub trait LinkDelivery: Send + Sync {
    async fn deliver(&self, email: &str, link: &str) -> CoreResult<()>;
}

/// Writes magic links to the log instead of mailing them.
pub struct LogDelivery;

#[async_trait]
impl LinkDelivery for LogDelivery {
    async fn deliver(&self, email: &str, link: &str) -> CoreResult<()> {
        tracing::info!(email = %Masked::from(email), %link, "Magic link issued");
        Ok(())
    }
}
