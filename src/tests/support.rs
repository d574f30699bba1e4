//! Mock stores and a cookie-aware test client for router-level tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::models::{ModelError, ModelResult, Snippet, SnippetStore, User, UserStore};
use crate::routes;
use crate::session::{generate_token, MemorySessionStore, SessionStore, SessionValues};
use crate::state::AppState;

pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "pa$$word";
pub const TAKEN_EMAIL: &str = "dupe@example.com";

lazy_static! {
    static ref CSRF_INPUT_RX: Regex = Regex::new(r#"name="csrf_token" value="([^"]+)""#).unwrap();
}

pub struct MockSnippetStore {
    snippets: Mutex<Vec<Snippet>>,
}

impl Default for MockSnippetStore {
    fn default() -> Self {
        let created = Utc.with_ymd_and_hms(2022, 1, 1, 10, 0, 0).unwrap();
        Self {
            snippets: Mutex::new(vec![Snippet {
                id: 1,
                title: "An old silent pond".to_string(),
                content: "An old silent pond...".to_string(),
                created,
                expires: Utc::now() + Duration::days(365),
            }]),
        }
    }
}

impl MockSnippetStore {
    pub fn count(&self) -> usize {
        self.snippets.lock().unwrap().len()
    }
}

#[async_trait]
impl SnippetStore for MockSnippetStore {
    async fn insert(&self, title: &str, content: &str, ttl_days: i64) -> ModelResult<i64> {
        let mut snippets = self.snippets.lock().unwrap();
        let id = snippets.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        snippets.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created: Utc::now(),
            expires: Utc::now() + Duration::days(ttl_days),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> ModelResult<Snippet> {
        self.snippets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ModelError::NoRecord)
    }

    async fn latest(&self, limit: i64) -> ModelResult<Vec<Snippet>> {
        let mut snippets = self.snippets.lock().unwrap().clone();
        snippets.sort_by(|a, b| b.id.cmp(&a.id));
        snippets.truncate(limit as usize);
        Ok(snippets)
    }

    async fn delete(&self, id: i64) -> ModelResult<()> {
        let mut snippets = self.snippets.lock().unwrap();
        let before = snippets.len();
        snippets.retain(|s| s.id != id);
        if snippets.len() == before {
            return Err(ModelError::NoRecord);
        }
        Ok(())
    }
}

/// Knows one user, alice (id 1).
#[derive(Default)]
pub struct MockUserStore {
    pub fail_exists: AtomicBool,
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn insert(&self, _name: &str, email: &str, _password: &str) -> ModelResult<()> {
        if email == TAKEN_EMAIL {
            return Err(ModelError::DuplicateEmail);
        }
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64> {
        if email == ALICE_EMAIL && password == ALICE_PASSWORD {
            Ok(1)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> ModelResult<bool> {
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(ModelError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(id == 1)
    }

    async fn get(&self, id: i64) -> ModelResult<User> {
        if id != 1 {
            return Err(ModelError::NoRecord);
        }
        Ok(User {
            id: 1,
            name: "Alice".to_string(),
            email: ALICE_EMAIL.to_string(),
            created: Utc.with_ymd_and_hms(2022, 3, 17, 10, 15, 0).unwrap(),
        })
    }

    async fn password_update(&self, id: i64, current_password: &str, _new_password: &str) -> ModelResult<()> {
        if id != 1 {
            return Err(ModelError::NoRecord);
        }
        if current_password != ALICE_PASSWORD {
            return Err(ModelError::InvalidCredentials);
        }
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.session.secret = Some("test-csrf-key-0123456789abcdefgh".to_string());
    config
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    pub fn csrf_token(&self) -> String {
        CSRF_INPUT_RX
            .captures(&self.body)
            .map(|c| c[1].to_string())
            .expect("page has no csrf_token input")
    }
}

/// The full application router with mock stores, plus one browser's cookie.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub snippets: Arc<MockSnippetStore>,
    pub users: Arc<MockUserStore>,
    pub sessions: MemorySessionStore,
    pub cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let snippets = Arc::new(MockSnippetStore::default());
        let users = Arc::new(MockUserStore::default());
        let sessions = MemorySessionStore::new();
        let state = AppState::new(test_config(), snippets.clone(), users.clone(), Arc::new(sessions.clone()));
        Self {
            router: routes::router(state.clone()),
            state,
            snippets,
            users,
            sessions,
            cookie: None,
        }
    }

    /// A second browser against the same server and stores.
    pub fn other_browser(&self) -> Self {
        Self {
            state: self.state.clone(),
            router: self.router.clone(),
            snippets: self.snippets.clone(),
            users: self.users.clone(),
            sessions: self.sessions.clone(),
            cookie: None,
        }
    }

    pub async fn send(&mut self, mut req: Request<Body>) -> TestResponse {
        let name = self.state.config.session.cookie_name.clone();
        if let Some(token) = &self.cookie {
            req.headers_mut()
                .insert(header::COOKIE, format!("{}={}", name, token).parse().unwrap());
        }

        let res = self.router.clone().oneshot(req).await.unwrap();

        for set_cookie in res.headers().get_all(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap();
            if let Some(value) = pair.strip_prefix(&format!("{}=", name)) {
                self.cookie = if value.is_empty() { None } else { Some(value.to_string()) };
            }
        }

        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        TestResponse { status, headers, body: String::from_utf8_lossy(&bytes).into_owned() }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    /// GETs `uri` and returns the CSRF token rendered into its forms.
    pub async fn csrf_token(&mut self, uri: &str) -> String {
        let res = self.get(uri).await;
        assert_eq!(res.status, StatusCode::OK, "GET {} failed", uri);
        res.csrf_token()
    }

    pub async fn login(&mut self) -> TestResponse {
        let token = self.csrf_token("/user/login").await;
        self.post_form(
            "/user/login",
            &[("email", ALICE_EMAIL), ("password", ALICE_PASSWORD), ("csrf_token", token.as_str())],
        )
        .await
    }

    /// Stores a session directly and adopts its cookie.
    pub async fn seed_session(&mut self, values: &[(&str, Value)]) {
        let values: SessionValues = values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        let token = generate_token();
        self.sessions
            .save(&token, &values, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        self.cookie = Some(token);
    }
}
