//! # Snippetbox
//!
//! A small multi-user web application for sharing text snippets. Visitors
//! read snippets; registered users create and delete them.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: HTTP server, routing and the middleware pipelines
//! - **SQLx**: snippet, user and session storage in SQLite
//! - **Tokio**: async runtime
//! - **Tracing**: structured logging
//!
//! ## Core Components
//!
//! - [`config`]: Layered configuration loading and validation
//! - [`db`]: Schema initialization
//! - [`error`]: HTTP error mapping
//! - [`forms`]: Submitted forms and their validation rules
//! - [`middleware`]: Request stages and the standard, dynamic and protected pipelines
//! - [`models`]: Snippet and user stores
//! - [`routes`]: Route table and handlers
//! - [`session`]: Server-side sessions and their stores
//! - [`state`]: Shared application state
//! - [`validator`]: Field validation helpers
//! - [`views`]: HTML pages

pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod validator;
pub mod views;

#[cfg(test)]
mod tests;
