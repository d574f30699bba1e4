use axum::{http::StatusCode, response::IntoResponse};

// Liveness probe: no session, no store access
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
