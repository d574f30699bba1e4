use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{connect_info::ConnectInfo, Request},
    middleware::Next,
    response::Response,
};

/// Logs one line per request: remote address, protocol, method, URI, status
/// and latency. The remote address is `-` when the listener does not provide
/// connection info (tests, custom services).
pub async fn log_request(req: Request, next: Next) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let version = req.version();
    let method = req.method().clone();
    let uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(req).await;

    tracing::info!(
        remote = %remote,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "{:?} {} {}",
        version,
        method,
        uri
    );
    response
}
