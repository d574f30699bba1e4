//! Session cookie parsing and formatting.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

/// Cookie attributes shared by every session cookie this process emits.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

/// Finds the value of cookie `name` across all `Cookie` headers.
pub fn find(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.trim_matches('"').to_string())
}

/// `Set-Cookie` value carrying `token` until `expiry`.
pub fn issue(settings: &CookieSettings, token: &str, expiry: DateTime<Utc>) -> Option<HeaderValue> {
    let max_age = (expiry - Utc::now()).num_seconds().max(0);
    let mut parts = vec![
        format!("{}={}", settings.name, token),
        "Path=/".to_string(),
        format!("Max-Age={}", max_age),
        format!("Expires={}", expiry.format("%a, %d %b %Y %H:%M:%S GMT")),
        "HttpOnly".to_string(),
        "SameSite=Lax".to_string(),
    ];
    if settings.secure {
        parts.push("Secure".to_string());
    }
    HeaderValue::from_str(&parts.join("; ")).ok()
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear(settings: &CookieSettings) -> Option<HeaderValue> {
    let mut parts = vec![
        format!("{}=", settings.name),
        "Path=/".to_string(),
        "Max-Age=0".to_string(),
        "Expires=Thu, 01 Jan 1970 00:00:00 GMT".to_string(),
        "HttpOnly".to_string(),
        "SameSite=Lax".to_string(),
    ];
    if settings.secure {
        parts.push("Secure".to_string());
    }
    HeaderValue::from_str(&parts.join("; ")).ok()
}
