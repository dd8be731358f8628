//! API index handler

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One reachable endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EndpointInfo {
    /// Request path
    pub path: String,

    /// What the endpoint does
    pub description: String,
}

/// API index response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
    /// Always `true`
    pub success: bool,

    /// Status message
    pub message: String,

    /// Service version
    pub version: String,

    /// Reachable endpoints
    pub endpoints: Vec<EndpointInfo>,
}

/// API index
#[utoipa::path(
    get,
    operation_id = "index",
    tag = "System",
    path = "/api",
    responses(
        (status = StatusCode::OK, description = "Index response", body = IndexResponse),
    )
)]
pub async fn handler() -> Json<IndexResponse> {
    let endpoints = [
        ("/api/email", "Email sending API"),
        ("/api/env", "Environment-default settings, masked"),
        ("/api/log-state", "Audit log read/write API"),
        ("/api/cron/cleanup-logs", "Cron job for log cleanup"),
    ]
    .into_iter()
    .map(|(path, description)| EndpointInfo {
        path: path.to_string(),
        description: description.to_string(),
    })
    .collect();

    Json(IndexResponse {
        success: true,
        message: "API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}
