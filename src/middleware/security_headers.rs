//! Security headers middleware for HTTP responses.
//!
//! Adds the browser-hardening headers to every response, static assets and
//! error pages included. The Content-Security-Policy and HSTS come from the
//! `[security]` configuration section.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::config::AppConfig;

/// Adds standard security-related HTTP headers to all responses.
///
/// # Security Headers Applied
///
/// - `Content-Security-Policy` from `security.csp` (skipped when blank)
/// - `Referrer-Policy: origin-when-cross-origin`
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: deny`
/// - `X-XSS-Protection: 0` - disables the legacy auditor, CSP replaces it
/// - Optional: `Strict-Transport-Security` (HSTS) via configuration
pub async fn secure_headers(State(cfg): State<Arc<AppConfig>>, req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    apply(res.headers_mut(), &cfg);
    res
}

fn apply(headers: &mut HeaderMap, cfg: &AppConfig) {
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("origin-when-cross-origin"),
    );
    headers.insert(HeaderName::from_static("x-content-type-options"), HeaderValue::from_static("nosniff"));
    headers.insert(HeaderName::from_static("x-frame-options"), HeaderValue::from_static("deny"));
    headers.insert(HeaderName::from_static("x-xss-protection"), HeaderValue::from_static("0"));

    let Some(sec) = cfg.security.as_ref() else {
        return;
    };
    if let Some(csp) = sec.csp.as_deref() {
        if !csp.trim().is_empty() {
            match HeaderValue::from_str(csp) {
                Ok(val) => {
                    headers.insert(HeaderName::from_static("content-security-policy"), val);
                }
                Err(e) => tracing::warn!("Ignoring invalid security.csp: {}", e),
            }
        }
    }
    if sec.enable_hsts.unwrap_or(false) {
        let max_age = sec.hsts_max_age.unwrap_or(31536000); // 1 year
        let include_sub = if sec.hsts_include_subdomains.unwrap_or(false) { "; includeSubDomains" } else { "" };
        let value = format!("max-age={}{}", max_age, include_sub);
        headers.insert(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("max-age=31536000")),
        );
    }
}
