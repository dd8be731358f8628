//! API handler modules

use std::any::Any;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::domain::audit::{AuditLog, LogEntry};

use super::errors::ErrorResponse;

pub mod cleanup;
pub mod docs;
pub mod email;
pub mod env;
pub mod index;
pub mod logs;

/// Record an audit event without letting a store failure reach the caller.
pub(crate) async fn record_best_effort<A: AuditLog>(audit: &A, entry: LogEntry) {
    if let Err(err) = audit.record(entry).await {
        warn!(error = %err, "failed to record audit event");
    }
}

/// Catch panics and return a 500 error
pub fn panic_handler(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };

    let error = ErrorResponse {
        success: false,
        message: details,
        error: None,
        needs_settings: false,
    };

    let response = Json(error).into_response();

    (StatusCode::INTERNAL_SERVER_ERROR, response).into_response()
}
