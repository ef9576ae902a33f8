use async_trait::async_trait;
use istore_core::{CoreError, CoreResult, SessionStore};
use redis::AsyncCommands;
use tracing::info;

use crate::new_login_token;

/// Session state kept in Redis so every API instance shares it.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> CoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error)
    }
}

fn redis_error(err: redis::RedisError) -> CoreError {
    CoreError::SessionError(err.to_string())
}

fn login_key(token: &str) -> String {
    format!("login:{}", token)
}

fn revoked_key(session_id: &str) -> String {
    format!("revoked:{}", session_id)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn issue_login_token(&self, email: &str, ttl_seconds: u64) -> CoreResult<String> {
        let mut conn = self.connection().await?;
        let token = new_login_token();
        conn.set_ex::<_, _, ()>(login_key(&token), email, ttl_seconds)
            .await
            .map_err(redis_error)?;
        Ok(token)
    }

    async fn consume_login_token(&self, token: &str) -> CoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        // GETDEL keeps a token single-use even when two verifications race.
        let email: Option<String> = redis::cmd("GETDEL")
            .arg(login_key(token))
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(email)
    }

    async fn revoke_session(&self, session_id: &str, ttl_seconds: u64) -> CoreResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(revoked_key(session_id), 1, ttl_seconds.max(1))
            .await
            .map_err(redis_error)?;
        info!("Session revoked: {}", session_id);
        Ok(())
    }

    async fn is_revoked(&self, session_id: &str) -> CoreResult<bool> {
        let mut conn = self.connection().await?;
        conn.exists(revoked_key(session_id)).await.map_err(redis_error)
    }

    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> CoreResult<bool> {
        let mut conn = self.connection().await?;
        let key = format!("ratelimit:{}", key);

        // NX arms the expiry on the first hit only, so the window is fixed.
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(window_seconds)
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        Ok(count <= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(login_key("abc"), "login:abc");
        assert_eq!(revoked_key("jti-1"), "revoked:jti-1");
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(RedisSessionStore::new("not a url").is_err());
    }
}
