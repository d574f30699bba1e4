use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::session::{Session, AUTHENTICATED_USER_ID, TARGET_URL_PATH};
use crate::state::AppState;

/// Whether the current request belongs to a logged-in user.
///
/// Derived fresh on every request by [`authenticate`] and never persisted.
/// Only this module can construct the authenticated form; a request the
/// stage did not see reads as anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthState(Inner);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Inner {
    #[default]
    Anonymous,
    Authenticated(i64),
}

impl AuthState {
    pub const ANONYMOUS: AuthState = AuthState(Inner::Anonymous);

    pub fn is_authenticated(&self) -> bool {
        matches!(self.0, Inner::Authenticated(_))
    }

    pub fn user_id(&self) -> Option<i64> {
        match self.0 {
            Inner::Authenticated(id) => Some(id),
            Inner::Anonymous => None,
        }
    }
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<AuthState>().copied().unwrap_or_default())
    }
}

/// Derives [`AuthState`] from the session's user id, confirming the user
/// still exists. A store failure aborts the request with 500.
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = match session.get_int(AUTHENTICATED_USER_ID).await {
        None | Some(0) => AuthState::ANONYMOUS,
        Some(id) => {
            if state.users.exists(id).await? {
                AuthState(Inner::Authenticated(id))
            } else {
                tracing::debug!("Session refers to missing user {}", id);
                AuthState::ANONYMOUS
            }
        }
    };
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Authorization gate for protected routes. Must run after [`authenticate`].
///
/// Anonymous requests are sent to the login page with the requested path
/// remembered; authenticated responses are marked uncacheable.
pub async fn require_authentication(auth: AuthState, session: Session, req: Request, next: Next) -> Response {
    if !auth.is_authenticated() {
        let path = req.uri().path().to_owned();
        session.put(TARGET_URL_PATH, path).await;
        return Redirect::to("/user/login").into_response();
    }

    let mut res = next.run(req).await;
    res.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    res
}
