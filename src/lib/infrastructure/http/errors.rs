//! API error-handling module

use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{audit::AuditError, email::SendError};

/// An error response
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// The error message
    #[schema(example = "Internal server error")]
    pub message: String,

    /// Sanitized error detail, when there is one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,

    /// Whether the caller should be redirected to configuration
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub needs_settings: bool,
}

/// An error raised in the API
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApiError {
    /// The status code
    #[schema(example = 500, value_type = u16)]
    #[serde(with = "http_serde::status_code")]
    pub status: StatusCode,

    /// The error message
    #[schema(example = "Internal server error")]
    pub message: String,

    /// Sanitized error detail
    pub detail: Option<String>,

    /// Whether the caller should be redirected to configuration
    pub needs_settings: bool,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            detail: None,
            needs_settings: false,
        }
    }

    /// Create a new bad request error
    pub fn new_400(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a new unauthorized error
    pub fn new_401(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Create new internal server error
    pub fn new_500(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Attach a sanitized detail
    pub fn with_detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Point the caller at configuration
    pub fn needs_settings(mut self) -> Self {
        self.needs_settings = true;
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                message: self.message,
                error: self.detail,
                needs_settings: self.needs_settings,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::new_500(&err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), &rejection.body_text())
    }
}

impl From<SendError> for ApiError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::NotConfigured(what) => ApiError::new_400(&format!("Missing {what}"))
                .with_detail(
                    "Provide it in the request, the session settings, or the server environment",
                )
                .needs_settings(),
            SendError::InvalidConfiguration(detail) => {
                ApiError::new_400("Invalid email configuration")
                    .with_detail(&detail)
                    .needs_settings()
            }
            other => ApiError::new_500("Failed to send email").with_detail(&other.to_string()),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::new_500("Failed to log state change").with_detail(&err.to_string())
    }
}
