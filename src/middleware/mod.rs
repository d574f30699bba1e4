//! Request-processing stages and the pipelines that compose them.
//!
//! Every stage is a plain async function wrapped with `from_fn` or
//! `from_fn_with_state`. Stages never run directly; [`chain::Pipeline`]
//! decides which ones wrap a router or a single route, and in which order.

pub mod auth;
pub mod chain;
pub mod csrf;
pub mod logging;
pub mod recover;
pub mod security_headers;
pub mod session;

pub use auth::AuthState;
pub use chain::{Pipeline, Stage, Wrap};
pub use csrf::CsrfToken;
