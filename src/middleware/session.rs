//! Session load-and-save stage.
//!
//! Resolves the session cookie to a [`Session`] before the handler runs and
//! writes changes back afterwards, issuing or clearing the cookie as needed.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::session::{cookie, CommitOutcome, Session};
use crate::state::AppState;

pub async fn load_and_save(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AppError> {
    let settings = state.cookie_settings();
    let lifetime = state.session_lifetime();

    let session = match cookie::find(req.headers(), &settings.name) {
        Some(token) => match state.sessions.load(&token).await? {
            Some(record) => Session::resume(token, record, lifetime),
            // Unknown or expired token: start over, the stale cookie is replaced on first write.
            None => Session::fresh(lifetime),
        },
        None => Session::fresh(lifetime),
    };
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    let set_cookie = match session.commit(state.sessions.as_ref()).await? {
        CommitOutcome::Unchanged => None,
        CommitOutcome::Saved { token, expiry } => cookie::issue(&settings, &token, expiry),
        CommitOutcome::Cleared => cookie::clear(&settings),
    };
    let headers = response.headers_mut();
    if let Some(value) = set_cookie {
        headers.append(header::SET_COOKIE, value);
    }
    headers.append(header::VARY, HeaderValue::from_static("Cookie"));
    Ok(response)
}
