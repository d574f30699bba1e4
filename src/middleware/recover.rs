//! Panic recovery.

use std::any::Any;
use std::backtrace::Backtrace;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::status_response;

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

pub fn layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

/// Turns a panic into a generic 500 and asks the client to drop the connection.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    tracing::error!("panic while handling request: {}\n{}", message, Backtrace::force_capture());

    let mut response = status_response(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    }
}
