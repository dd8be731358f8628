//! Scheduled log cleanup, authorized by a bearer token.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{audit::AuditLog, email::EmailService},
    infrastructure::http::{
        errors::{ApiError, ErrorResponse},
        state::AppState,
    },
};

/// Log cleanup response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    /// Always `true`
    pub success: bool,

    /// Outcome message
    pub message: String,

    /// Per-day bucket keys that were deleted
    pub deleted_keys: Vec<String>,

    /// When the cleanup ran
    pub timestamp: DateTime<Utc>,
}

fn authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|secret| !secret.is_empty()) else {
        return false;
    };

    let Some(header) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let expected = format!("Bearer {secret}");

    constant_time_eq(header.as_bytes(), expected.as_bytes())
}

/// Delete per-day log buckets older than yesterday
#[utoipa::path(
    post,
    operation_id = "cleanup_logs",
    tag = "Logs",
    path = "/api/cron/cleanup-logs",
    responses(
        (status = StatusCode::OK, description = "Cleanup completed", body = CleanupResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Missing or wrong bearer token", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService, A: AuditLog>(
    State(state): State<AppState<E, A>>,
    headers: HeaderMap,
) -> Result<Json<CleanupResponse>, ApiError> {
    if !authorized(&headers, state.config.cron_secret.as_deref()) {
        return Err(ApiError::new_401("Unauthorized"));
    }

    let deleted_keys = state
        .audit
        .purge_stale()
        .await
        .map_err(|e| ApiError::new_500("Failed to clean up logs").with_detail(&e.to_string()))?;

    Ok(Json(CleanupResponse {
        success: true,
        message: "Log cleanup completed successfully".to_string(),
        deleted_keys,
        timestamp: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use testresult::TestResult;

    use crate::{
        domain::audit::MockAuditLog,
        infrastructure::http::{router, state::tests::test_state},
    };

    use super::*;

    fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
        )
    }

    #[tokio::test]
    async fn test_cleanup_requires_a_token() -> TestResult {
        let state = test_state(None, None);

        let response = TestServer::new(router(state))?
            .post("/api/cron/cleanup-logs")
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        Ok(())
    }

    #[tokio::test]
    async fn test_cleanup_rejects_a_wrong_token() -> TestResult {
        let state = test_state(None, None);
        let (name, value) = bearer("wrong-token");

        let response = TestServer::new(router(state))?
            .post("/api/cron/cleanup-logs")
            .add_header(name, value)
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        Ok(())
    }

    #[tokio::test]
    async fn test_cleanup_reports_deleted_buckets() -> TestResult {
        let mut audit = MockAuditLog::new();
        audit
            .expect_purge_stale()
            .times(1)
            .returning(|| Ok(vec!["logs:2024-01-01".to_string()]));

        // `cron-secret-token` matches the secret seeded by `test_state`.
        let state = test_state(None, Some(audit));
        let (name, value) = bearer("cron-secret-token");

        let response = TestServer::new(router(state))?
            .post("/api/cron/cleanup-logs")
            .add_header(name, value)
            .await;

        response.assert_status_ok();
        let json = response.json::<CleanupResponse>();

        assert!(json.success);
        assert_eq!(json.message, "Log cleanup completed successfully");
        assert_eq!(json.deleted_keys, vec!["logs:2024-01-01"]);

        Ok(())
    }

    #[test]
    fn test_authorization_is_fail_closed_without_a_secret() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer anything"));

        assert!(!authorized(&headers, None));
        assert!(!authorized(&headers, Some("")));
    }
}
