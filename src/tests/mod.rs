//! Router-level tests for the Snippetbox application.
//!
//! These drive the complete router (all three pipelines plus handlers) with
//! mock record stores and the in-memory session store.
//!
//! ## Test Modules
//!
//! - **support**: Mock stores and a cookie-tracking test client
//! - **pipeline_tests**: Recovery, security headers, sessions, CSRF and the login gate
//! - **handler_tests**: Page handlers, forms and the login/logout flows
//!
//! Individual test modules can be run with:
//! ```bash
//! cargo test pipeline_tests
//! cargo test handler_tests
//! ```

pub mod support;
pub mod handler_tests;
