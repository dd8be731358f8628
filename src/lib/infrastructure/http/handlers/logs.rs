//! Audit log read/write API.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    domain::{
        audit::{AuditLog, LogEntry},
        email::EmailService,
    },
    infrastructure::http::{
        errors::{ApiError, ErrorResponse},
        state::AppState,
    },
};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// Log write request body
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RecordLogBody {
    /// Event type
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Structured event payload
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

/// Log write response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordLogResponse {
    /// Always `true`
    pub success: bool,

    /// Outcome message
    pub message: String,
}

/// Query parameters for the recent-entries read
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of entries to return
    pub limit: Option<usize>,
}

/// Recent log entries response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentLogsResponse {
    /// Always `true`
    pub success: bool,

    /// Number of entries returned
    pub count: usize,

    /// Entries, newest first
    pub entries: Vec<LogEntry>,
}

/// Record an audit event
#[utoipa::path(
    post,
    operation_id = "record_log",
    tag = "Logs",
    path = "/api/log-state",
    request_body = RecordLogBody,
    responses(
        (status = StatusCode::OK, description = "Event recorded", body = RecordLogResponse),
        (status = StatusCode::BAD_REQUEST, description = "Missing fields", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn record_handler<E: EmailService, A: AuditLog>(
    State(state): State<AppState<E, A>>,
    request: Result<Json<RecordLogBody>, JsonRejection>,
) -> Result<Json<RecordLogResponse>, ApiError> {
    let Json(body) = request?;

    let (Some(kind), Some(data)) = (body.kind, body.data) else {
        return Err(ApiError::new_400("Missing required fields: type, data"));
    };

    state
        .audit
        .record(LogEntry::new(&kind, None, data))
        .await?;

    Ok(Json(RecordLogResponse {
        success: true,
        message: "State change logged successfully".to_string(),
    }))
}

/// Recent audit entries, newest first
#[utoipa::path(
    get,
    operation_id = "recent_logs",
    tag = "Logs",
    path = "/api/log-state",
    params(RecentQuery),
    responses(
        (status = StatusCode::OK, description = "Recent entries", body = RecentLogsResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn recent_handler<E: EmailService, A: AuditLog>(
    State(state): State<AppState<E, A>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentLogsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let entries = state
        .audit
        .recent(limit)
        .await
        .map_err(|e| ApiError::new_500("Failed to read recent logs").with_detail(&e.to_string()))?;

    Ok(Json(RecentLogsResponse {
        success: true,
        count: entries.len(),
        entries,
    }))
}
