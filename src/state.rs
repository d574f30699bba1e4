use std::sync::Arc;

use rand::RngCore;

use crate::config::{AppConfig, MAX_SESSION_LIFETIME_HOURS};
use crate::models::{SnippetStore, SqliteSnippetStore, SqliteUserStore, UserStore};
use crate::session::cookie::CookieSettings;
use crate::session::{SessionStore, SqliteSessionStore};

/// The shared application state.
///
/// Built once at startup and cloned into every request. Stores sit behind
/// trait objects so tests can swap in mocks without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application configuration.
    pub config: Arc<AppConfig>,
    pub snippets: Arc<dyn SnippetStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    /// Server-side key for deriving per-session CSRF tokens.
    pub csrf_key: Arc<[u8]>,
}

impl AppState {
    /// Creates a new `AppState` from explicit stores.
    ///
    /// When `session.secret` is empty a random CSRF key is generated, so
    /// tokens stop validating after a restart.
    pub fn new(
        config: AppConfig,
        snippets: Arc<dyn SnippetStore>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let csrf_key: Arc<[u8]> = match config.session.secret.as_deref() {
            Some(secret) if !secret.is_empty() => Arc::from(secret.as_bytes()),
            _ => {
                tracing::warn!("session.secret is not set - using a random CSRF key for this process");
                let mut key = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut key);
                Arc::from(&key[..])
            }
        };

        Self { config: Arc::new(config), snippets, users, sessions, csrf_key }
    }

    /// All stores backed by one SQLite pool.
    pub fn sqlite(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(SqliteSnippetStore::new(db.clone())),
            Arc::new(SqliteUserStore::new(db.clone())),
            Arc::new(SqliteSessionStore::new(db)),
        )
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            name: self.config.session.cookie_name.clone(),
            secure: self.config.session.secure,
        }
    }

    /// Session lifetime, clamped to the range `config::validate` accepts.
    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.session.lifetime_hours.clamp(1, MAX_SESSION_LIFETIME_HOURS))
    }
}
