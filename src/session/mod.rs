//! Server-side sessions.
//!
//! A session is addressed by an opaque random token carried in one cookie.
//! The values live in a [`SessionStore`] with a fixed absolute expiry. For the
//! duration of a request the loaded state sits behind a [`Session`] handle in
//! the request extensions; the session stage in
//! [`crate::middleware::session`] writes it back once the handler returns.

pub mod cookie;
pub mod memory;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::AppError;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

pub const AUTHENTICATED_USER_ID: &str = "authenticated_user_id";
pub const FLASH: &str = "flash";
pub const TARGET_URL_PATH: &str = "target_url_path";
pub const CSRF_SECRET: &str = "csrf_secret";

/// Untyped per-session values.
pub type SessionValues = HashMap<String, Value>;

/// What a store hands back for a live token.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub values: SessionValues,
    pub expiry: DateTime<Utc>,
}

/// Pluggable session persistence.
///
/// `load` must treat an expired record as absent. Concurrent saves to the same
/// token are last-write-wins for the whole record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, token: &str) -> anyhow::Result<Option<SessionRecord>>;
    async fn save(&self, token: &str, values: &SessionValues, expiry: DateTime<Utc>) -> anyhow::Result<()>;
    async fn destroy(&self, token: &str) -> anyhow::Result<()>;
    /// Removes expired records, returning how many went away.
    async fn delete_expired(&self) -> anyhow::Result<u64>;
}

/// 32 random bytes, base64url without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug)]
struct SessionState {
    token: Option<String>,
    /// Tokens that must be removed from the store on commit.
    retired: Vec<String>,
    values: SessionValues,
    expiry: DateTime<Utc>,
    lifetime: Duration,
    modified: bool,
}

/// Result of writing a request's session back to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Nothing changed; the client's cookie (if any) stays valid.
    Unchanged,
    /// Values were persisted under `token`; the cookie must be (re)issued.
    Saved { token: String, expiry: DateTime<Utc> },
    /// The session ended up empty; the cookie must be cleared.
    Cleared,
}

/// Request-scoped handle to the current session.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// A new, empty session. Nothing is stored until a value is put.
    pub fn fresh(lifetime: Duration) -> Self {
        Self::build(None, SessionValues::new(), Utc::now() + lifetime, lifetime)
    }

    /// Resumes a session loaded from the store.
    pub fn resume(token: String, record: SessionRecord, lifetime: Duration) -> Self {
        Self::build(Some(token), record.values, record.expiry, lifetime)
    }

    fn build(token: Option<String>, values: SessionValues, expiry: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                token,
                retired: Vec::new(),
                values,
                expiry,
                lifetime,
                modified: false,
            })),
        }
    }

    /// Integer value for `key`; absent or non-integer reads as `None`.
    pub async fn get_int(&self, key: &str) -> Option<i64> {
        self.state.lock().await.values.get(key).and_then(Value::as_i64)
    }

    pub async fn get_string(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .values
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Reads and removes a string value (flash semantics).
    pub async fn pop_string(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock().await;
        let value = state.values.remove(key)?;
        state.modified = true;
        value.as_str().map(str::to_owned)
    }

    pub async fn put(&self, key: &str, value: impl Into<Value>) {
        let mut state = self.state.lock().await;
        state.values.insert(key.to_string(), value.into());
        state.modified = true;
    }

    pub async fn remove(&self, key: &str) {
        let mut state = self.state.lock().await;
        if state.values.remove(key).is_some() {
            state.modified = true;
        }
    }

    /// Issues a new token for the same values, e.g. on privilege change.
    ///
    /// The CSRF secret is dropped with the old token so forms rendered for
    /// the previous session stop validating.
    pub async fn renew_token(&self) {
        let mut state = self.state.lock().await;
        if let Some(old) = state.token.take() {
            state.retired.push(old);
        }
        state.values.remove(CSRF_SECRET);
        state.modified = true;
    }

    /// Clears every value and retires the token. Values put afterwards start
    /// a brand-new session with a fresh expiry.
    pub async fn destroy(&self) {
        let mut state = self.state.lock().await;
        if let Some(old) = state.token.take() {
            state.retired.push(old);
        }
        state.values.clear();
        state.expiry = Utc::now() + state.lifetime;
        state.modified = true;
    }

    /// Current token, if the session has been persisted before.
    pub async fn token(&self) -> Option<String> {
        self.state.lock().await.token.clone()
    }

    /// Writes the session back to `store`.
    pub async fn commit(&self, store: &dyn SessionStore) -> anyhow::Result<CommitOutcome> {
        let mut state = self.state.lock().await;

        for old in std::mem::take(&mut state.retired) {
            store.destroy(&old).await?;
        }

        if !state.modified {
            return Ok(CommitOutcome::Unchanged);
        }
        state.modified = false;

        if state.values.is_empty() {
            if let Some(token) = state.token.take() {
                store.destroy(&token).await?;
            }
            return Ok(CommitOutcome::Cleared);
        }

        let token = state.token.get_or_insert_with(generate_token).clone();
        store.save(&token, &state.values, state.expiry).await?;
        Ok(CommitOutcome::Saved { token, expiry: state.expiry })
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session stage is not installed on this route")))
    }
}
