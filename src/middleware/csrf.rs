//! Cross-Site Request Forgery (CSRF) protection.
//!
//! Each session carries a random CSRF secret. The token handed to forms is
//! `base64url(HMAC-SHA256(server key, secret))`, so it is stable for the
//! session, unique to it, and useless once the session token is renewed
//! (renewal drops the secret). Unsafe requests must echo the token in the
//! `X-CSRF-Token` header or the `csrf_token` form field.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;
use crate::session::{generate_token, Session, CSRF_SECRET};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// The token for the current session, as exposed to views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("CSRF stage is not installed on this route")))
    }
}

fn mac(key: &[u8], secret: &str) -> anyhow::Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| anyhow::anyhow!("invalid CSRF key: {}", e))?;
    mac.update(secret.as_bytes());
    Ok(mac)
}

pub fn derive_token(key: &[u8], secret: &str) -> anyhow::Result<String> {
    Ok(URL_SAFE_NO_PAD.encode(mac(key, secret)?.finalize().into_bytes()))
}

/// Constant-time check of `candidate` against the token for `secret`.
pub fn verify_token(key: &[u8], secret: &str, candidate: &str) -> bool {
    let Ok(signature) = URL_SAFE_NO_PAD.decode(candidate.trim()) else {
        return false;
    };
    match mac(key, secret) {
        Ok(mac) => mac.verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

/// CSRF stage. Runs after the session is loaded.
pub async fn guard(
    State(state): State<AppState>,
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut req, secret) = if req.method().is_safe() {
        let secret = match session.get_string(CSRF_SECRET).await {
            Some(secret) => secret,
            None => {
                let secret = generate_token();
                session.put(CSRF_SECRET, secret.clone()).await;
                secret
            }
        };
        (req, secret)
    } else {
        let Some(secret) = session.get_string(CSRF_SECRET).await else {
            tracing::debug!("Rejecting {} {}: session has no CSRF secret", req.method(), req.uri().path());
            return Err(AppError::InvalidCsrfToken);
        };
        let (req, submitted) = submitted_token(req, state.config.server.max_body_bytes).await?;
        let valid = submitted
            .as_deref()
            .is_some_and(|candidate| verify_token(&state.csrf_key, &secret, candidate));
        if !valid {
            tracing::debug!("Rejecting {} {}: CSRF token missing or mismatched", req.method(), req.uri().path());
            return Err(AppError::InvalidCsrfToken);
        }
        (req, secret)
    };

    let token = derive_token(&state.csrf_key, &secret)?;
    req.extensions_mut().insert(CsrfToken(token));
    Ok(next.run(req).await)
}

/// Media types are case-insensitive and may carry parameters.
fn is_urlencoded(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

/// Finds the submitted token. A urlencoded body is buffered to read the form
/// field and handed back unchanged inside the returned request.
async fn submitted_token(req: Request, limit: usize) -> Result<(Request, Option<String>), AppError> {
    let from_header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if from_header.is_some() {
        return Ok((req, from_header));
    }

    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_urlencoded);
    if !is_form {
        return Ok((req, None));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable form body: {}", e)))?;
    let token = url::form_urlencoded::parse(&bytes)
        .find(|(k, _)| k == CSRF_FORM_FIELD)
        .map(|(_, v)| v.into_owned());
    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}
