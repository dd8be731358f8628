//! Environment-default settings view.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{audit::AuditLog, email::EmailService, settings::EmailSettings},
    infrastructure::http::state::AppState,
};

/// Environment settings response. Secrets are masked; the raw values never
/// leave the process.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnvResponse {
    /// Always `true`
    pub success: bool,

    /// The environment-default settings, secrets masked
    pub data: EmailSettings,
}

/// Environment-default settings, masked
#[utoipa::path(
    get,
    operation_id = "env_settings",
    tag = "System",
    path = "/api/env",
    responses(
        (status = StatusCode::OK, description = "Masked environment defaults", body = EnvResponse),
    )
)]
pub async fn handler<E: EmailService, A: AuditLog>(
    State(state): State<AppState<E, A>>,
) -> Json<EnvResponse> {
    Json(EnvResponse {
        success: true,
        data: state.settings.env_defaults().masked(),
    })
}
