//! Redis-backed session store and session cookie helpers.
//!
//! Sessions are `session:{token}` keys mapping to the user id, with an absolute
//! TTL enforced by Redis. Created at login, deleted at logout, otherwise left to
//! expire passively.

use anyhow::{Context, Result};
use axum::http::{header::InvalidHeaderValue, HeaderValue};
use redis::{aio::MultiplexedConnection, AsyncCommands};
use uuid::Uuid;

use super::utils::generate_session_token;

pub const SESSION_COOKIE_NAME: &str = "session_id";

/// 30 days, shared between the Redis TTL and the cookie Max-Age.
pub const SESSION_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone)]
pub struct SessionStore {
    client: redis::Client,
}

impl SessionStore {
    /// Parse the Redis URL. No connection is made until the first operation.
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .with_context(|| format!("Invalid Redis URL: {redis_url}"))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_tokio_connection()
            .await
            .context("Failed to connect to session store")
    }

    /// Startup probe so a misconfigured store fails fast instead of at the
    /// first login.
    pub async fn ping(&self) -> Result<()> {
        let mut connection = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .context("Session store did not answer")?;
        Ok(())
    }

    /// Create a session for `user_id` and return the opaque token.
    pub async fn create_session(&self, user_id: Uuid, ttl_seconds: u64) -> Result<String> {
        let token = generate_session_token();
        let mut connection = self.connection().await?;
        connection
            .set_ex::<_, _, ()>(session_key(&token), user_id.to_string(), ttl_seconds)
            .await
            .context("Failed to store session")?;
        Ok(token)
    }

    /// Resolve a token to a user id; `None` when absent or expired.
    pub async fn get_user_id(&self, token: &str) -> Result<Option<Uuid>> {
        let mut connection = self.connection().await?;
        let value: Option<String> = connection
            .get(session_key(token))
            .await
            .context("Failed to look up session")?;
        Ok(value.and_then(|raw| Uuid::parse_str(&raw).ok()))
    }

    /// Delete a session. Idempotent: deleting an absent token is not an error.
    pub async fn delete_session(&self, token: &str) -> Result<()> {
        let mut connection = self.connection().await?;
        connection
            .del::<_, ()>(session_key(token))
            .await
            .context("Failed to delete session")?;
        Ok(())
    }
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// Build the `Set-Cookie` value for a fresh session token.
pub(super) fn session_cookie(
    token: &str,
    ttl_seconds: u64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={ttl_seconds}"
    ))
}

/// Expire the cookie client-side; used at logout regardless of whether the
/// server-side session still existed.
pub(super) fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session_id=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_is_namespaced() {
        assert_eq!(session_key("abc"), "session:abc");
    }

    #[test]
    fn store_construction_rejects_bad_url() {
        assert!(SessionStore::new("not-a-url").is_err());
        assert!(SessionStore::new("redis://127.0.0.1:6379").is_ok());
    }

    #[test]
    fn session_cookie_carries_required_attributes() -> anyhow::Result<()> {
        let cookie = session_cookie("tok123", SESSION_TTL_SECONDS)?;
        let value = cookie.to_str()?;
        assert!(value.starts_with("session_id=tok123;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=2592000"));
        Ok(())
    }

    #[test]
    fn clear_cookie_expires_immediately() -> anyhow::Result<()> {
        let value = clear_session_cookie();
        let value = value.to_str()?;
        assert!(value.starts_with(&format!("{SESSION_COOKIE_NAME}=;")));
        assert!(value.contains("Max-Age=0"));
        Ok(())
    }
}
