//! HTTP route table.
//!
//! - `health`: liveness ping
//! - `snippets`: home, about and snippet pages
//! - `users`: signup, login, logout and account pages
//!
//! Each session-aware route is wrapped in the dynamic or protected pipeline;
//! static assets and the ping only get the standard pipeline, which wraps
//! everything.

pub mod health;
pub mod snippets;
pub mod users;

use axum::{
    http::StatusCode,
    response::Response,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::services::ServeDir;

use crate::error::status_response;
use crate::middleware::Pipeline;
use crate::state::AppState;

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    // Pipelines wrap each route's handlers only, so an unknown method still
    // gets the method router's 405 without loading a session.
    let dynamic = |route: MethodRouter<AppState>| Pipeline::Dynamic.apply(route, &state);
    let protected = |route: MethodRouter<AppState>| Pipeline::Protected.apply(route, &state);

    // Directories are not listed: a path naming one is a 404.
    let static_files = ServeDir::new(&state.config.server.static_dir).append_index_html_on_directories(false);

    let app = Router::new()
        .route("/ping", get(health::ping))
        .nest_service("/static", static_files)
        .route("/", dynamic(get(snippets::home)))
        .route("/about", dynamic(get(snippets::about)))
        .route("/snippet/view/{id}", dynamic(get(snippets::view)))
        .route("/user/signup", dynamic(get(users::signup).post(users::signup_post)))
        .route("/user/login", dynamic(get(users::login).post(users::login_post)))
        .route(
            "/snippet/create",
            protected(get(snippets::create).post(snippets::create_post)),
        )
        .route("/snippet/delete/{id}", protected(post(snippets::delete_post)))
        .route("/account/view", protected(get(users::account_view)))
        .route(
            "/account/password/update",
            protected(get(users::password_update).post(users::password_update_post)),
        )
        .route("/user/logout", protected(post(users::logout_post)))
        .fallback(not_found)
        .with_state(state.clone());

    Pipeline::Standard.apply(app, &state)
}

async fn not_found() -> Response {
    status_response(StatusCode::NOT_FOUND)
}
