//! Named middleware pipelines.
//!
//! A pipeline is an ordered list of stages, outermost first. Applying it folds
//! the list onto a router in reverse, because the last `layer` call ends up
//! outermost.
//!
//! The standard pipeline wraps the whole router, fallbacks included. The
//! dynamic and protected pipelines wrap single method routers and only layer
//! the handlers registered on them. The method router's own 405 fallback and
//! the router's 404 fallback stay outside, so neither touches the session.

use std::convert::Infallible;

use axum::extract::Request;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::routing::{MethodRouter, Route};
use axum::Router;
use tower::{Layer, Service};

use super::{auth, csrf, logging, recover, security_headers, session};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Recover,
    LogRequest,
    SecureHeaders,
    LoadSession,
    Csrf,
    Authenticate,
    RequireAuthentication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Every request, static assets included.
    Standard,
    /// Routes that read or write the session.
    Dynamic,
    /// Dynamic routes that require a logged-in user.
    Protected,
}

const STANDARD: &[Stage] = &[Stage::Recover, Stage::LogRequest, Stage::SecureHeaders];
const DYNAMIC: &[Stage] = &[Stage::LoadSession, Stage::Csrf, Stage::Authenticate];
const PROTECTED: &[Stage] = &[
    Stage::LoadSession,
    Stage::Csrf,
    Stage::Authenticate,
    Stage::RequireAuthentication,
];

impl Pipeline {
    /// Stages in execution order.
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Pipeline::Standard => STANDARD,
            Pipeline::Dynamic => DYNAMIC,
            Pipeline::Protected => PROTECTED,
        }
    }

    /// Wraps `target` in this pipeline's stages.
    ///
    /// Pass the whole [`Router`] for the standard pipeline and a route's
    /// [`MethodRouter`] for the dynamic and protected ones.
    pub fn apply<T: Wrap>(self, target: T, state: &AppState) -> T {
        self.stages()
            .iter()
            .rev()
            .fold(target, |target, stage| stage.wrap(target, state))
    }
}

/// Something a stage can be layered onto.
pub trait Wrap: Sized {
    fn wrap_with<L>(self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static;
}

/// Layers the whole router, the 404 fallback included.
impl<S> Wrap for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn wrap_with<L>(self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layer(layer)
    }
}

/// Layers only the registered method handlers, never the 405 fallback.
impl<S> Wrap for MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn wrap_with<L>(self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.route_layer(layer)
    }
}

impl Stage {
    fn wrap<T: Wrap>(self, target: T, state: &AppState) -> T {
        match self {
            Stage::Recover => target.wrap_with(recover::layer()),
            Stage::LogRequest => target.wrap_with(from_fn(logging::log_request)),
            Stage::SecureHeaders => target.wrap_with(from_fn_with_state(
                state.config.clone(),
                security_headers::secure_headers,
            )),
            Stage::LoadSession => target.wrap_with(from_fn_with_state(state.clone(), session::load_and_save)),
            Stage::Csrf => target.wrap_with(from_fn_with_state(state.clone(), csrf::guard)),
            Stage::Authenticate => target.wrap_with(from_fn_with_state(state.clone(), auth::authenticate)),
            Stage::RequireAuthentication => target.wrap_with(from_fn(auth::require_authentication)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(stages: &[Stage], stage: Stage) -> usize {
        stages.iter().position(|s| *s == stage).unwrap()
    }

    #[test]
    fn test_recovery_is_outermost() {
        assert_eq!(Pipeline::Standard.stages()[0], Stage::Recover);
    }

    #[test]
    fn test_session_before_csrf_before_authentication() {
        for pipeline in [Pipeline::Dynamic, Pipeline::Protected] {
            let stages = pipeline.stages();
            assert!(position(stages, Stage::LoadSession) < position(stages, Stage::Csrf));
            assert!(position(stages, Stage::Csrf) < position(stages, Stage::Authenticate));
        }
    }

    #[test]
    fn test_protected_extends_dynamic_with_gate_last() {
        let protected = Pipeline::Protected.stages();
        assert_eq!(&protected[..protected.len() - 1], Pipeline::Dynamic.stages());
        assert_eq!(protected.last(), Some(&Stage::RequireAuthentication));
        assert!(!Pipeline::Dynamic.stages().contains(&Stage::RequireAuthentication));
    }
}
