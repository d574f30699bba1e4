//! Record stores for snippets and users.
//!
//! Handlers only see the [`SnippetStore`] and [`UserStore`] traits; the SQLite
//! implementations live in the submodules and tests swap in mocks.

pub mod snippets;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use snippets::SqliteSnippetStore;
pub use users::SqliteUserStore;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created: DateTime<Utc>,
}

#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Stores a snippet that expires `ttl_days` from now and returns its id.
    async fn insert(&self, title: &str, content: &str, ttl_days: i64) -> ModelResult<i64>;
    /// Fetches an unexpired snippet.
    async fn get(&self, id: i64) -> ModelResult<Snippet>;
    /// Unexpired snippets, newest first.
    async fn latest(&self, limit: i64) -> ModelResult<Vec<Snippet>>;
    async fn delete(&self, id: i64) -> ModelResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`ModelError::DuplicateEmail`] when the address is taken.
    async fn insert(&self, name: &str, email: &str, password: &str) -> ModelResult<()>;
    /// Returns the user id, or [`ModelError::InvalidCredentials`].
    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64>;
    async fn exists(&self, id: i64) -> ModelResult<bool>;
    async fn get(&self, id: i64) -> ModelResult<User>;
    async fn password_update(&self, id: i64, current_password: &str, new_password: &str) -> ModelResult<()>;
}
