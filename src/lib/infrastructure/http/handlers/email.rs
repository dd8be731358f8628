//! Email API: status, settings management, and sending.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        audit::{event, AuditLog, LogEntry},
        email::{EmailMessage, EmailService, Recipients, SendMethod},
        settings::{EmailSettings, SettingsPatch},
    },
    infrastructure::http::{
        errors::{ApiError, ErrorResponse},
        handlers::record_best_effort,
        session::SessionId,
        state::AppState,
    },
};

/// One action accepted by the POST endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionInfo {
    /// Action marker to put in the request body
    pub action: String,

    /// HTTP method the action uses
    pub method: String,

    /// What the action does
    pub description: String,
}

fn available_actions() -> Vec<ActionInfo> {
    [
        ("updateSettings", "Update email settings"),
        ("resetSettings", "Reset to server settings"),
        ("sendEmail", "Send an email (default action for POST)"),
    ]
    .into_iter()
    .map(|(action, description)| ActionInfo {
        action: action.to_string(),
        method: "POST".to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// Email API status response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailStatusResponse {
    /// Always `true`
    pub success: bool,

    /// Status message
    pub message: String,

    /// Whether the environment supplies every required field
    pub env_vars_loaded: bool,

    /// Whether the session's resolved configuration is missing required
    /// fields
    pub configuration_incomplete: bool,

    /// The session's resolved settings, secrets masked
    #[serde(flatten)]
    pub settings: EmailSettings,

    /// Actions accepted by POST
    pub available_actions: Vec<ActionInfo>,
}

/// POST request body: a settings action or, by default, a send.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailPostBody {
    /// Action marker; absent means send
    pub action: Option<String>,

    /// Settings supplied with the request
    #[serde(flatten)]
    pub settings: SettingsPatch,

    /// Recipient address(es)
    pub to: Option<Recipients>,

    /// Subject line
    pub subject: Option<String>,

    /// Plain text body
    pub text: Option<String>,

    /// HTML body
    pub html: Option<String>,

    /// Transport to use; defaults to SMTP
    #[schema(value_type = Option<String>, example = "smtp")]
    pub method: Option<SendMethod>,
}

/// Settings update response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateSettingsResponse {
    /// Always `true`
    pub success: bool,

    /// Outcome message
    pub message: String,

    /// The session's settings after the update, secrets masked
    pub settings: EmailSettings,
}

/// Settings reset response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetSettingsResponse {
    /// Always `true`
    pub success: bool,

    /// Outcome message
    pub message: String,

    /// The environment-default settings, secrets masked
    #[serde(flatten)]
    pub settings: EmailSettings,
}

/// Send response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    /// Always `true`
    pub success: bool,

    /// Outcome message
    pub message: String,

    /// Identifier the transport assigned to the accepted message
    pub message_id: String,
}

/// Email API status
#[utoipa::path(
    get,
    operation_id = "email_status",
    tag = "Email",
    path = "/api/email",
    responses(
        (status = StatusCode::OK, description = "Status and masked settings", body = EmailStatusResponse),
    )
)]
pub async fn status_handler<E: EmailService, A: AuditLog>(
    State(state): State<AppState<E, A>>,
    SessionId(session): SessionId,
) -> Result<Json<EmailStatusResponse>, ApiError> {
    let env_vars_loaded = state.settings.env_complete();
    let resolved = state.settings.resolve(&session, &SettingsPatch::default());

    let message = if env_vars_loaded {
        "Email API is running with environment variables"
    } else {
        "Email API is running"
    };

    Ok(Json(EmailStatusResponse {
        success: true,
        message: message.to_string(),
        env_vars_loaded,
        configuration_incomplete: !resolved.is_complete(),
        settings: resolved.settings.masked(),
        available_actions: available_actions(),
    }))
}

/// Update settings, reset settings, or send an email
#[utoipa::path(
    post,
    operation_id = "email_action",
    tag = "Email",
    path = "/api/email",
    request_body = EmailPostBody,
    responses(
        (status = StatusCode::OK, description = "Send accepted or settings changed", body = SendEmailResponse),
        (status = StatusCode::BAD_REQUEST, description = "Missing fields or unusable configuration", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Transport failure", body = ErrorResponse),
    )
)]
pub async fn action_handler<E: EmailService, A: AuditLog>(
    State(state): State<AppState<E, A>>,
    SessionId(session): SessionId,
    request: Result<Json<EmailPostBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = request?;
    let request_id = Uuid::new_v4();

    match body.action.as_deref() {
        Some("updateSettings") => {
            update_settings(&state, &session, request_id, &body.settings).await
        }
        Some("resetSettings") => reset_settings(&state, &session, request_id).await,
        _ => send_email(&state, &session, request_id, body).await,
    }
}

async fn update_settings<E: EmailService, A: AuditLog>(
    state: &AppState<E, A>,
    session: &str,
    request_id: Uuid,
    patch: &SettingsPatch,
) -> Result<Response, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::new_400("No settings provided"));
    }

    let change = state.settings.apply(session, patch);

    record_best_effort(
        state.audit.as_ref(),
        LogEntry::new(
            event::SETTINGS_UPDATE_BEFORE,
            Some(request_id),
            json!({ "currentSettings": &change.before }),
        ),
    )
    .await;

    record_best_effort(
        state.audit.as_ref(),
        LogEntry::new(
            event::SETTINGS_UPDATE_AFTER,
            Some(request_id),
            json!({ "newSettings": &change.after }),
        ),
    )
    .await;

    Ok(Json(UpdateSettingsResponse {
        success: true,
        message: "Settings applied for current session".to_string(),
        settings: change.after.masked(),
    })
    .into_response())
}

async fn reset_settings<E: EmailService, A: AuditLog>(
    state: &AppState<E, A>,
    session: &str,
    request_id: Uuid,
) -> Result<Response, ApiError> {
    let defaults = state.settings.reset(session);

    record_best_effort(
        state.audit.as_ref(),
        LogEntry::new(
            event::SETTINGS_RESET,
            Some(request_id),
            json!({ "serverSettings": &defaults }),
        ),
    )
    .await;

    Ok(Json(ResetSettingsResponse {
        success: true,
        message: "Current server settings retrieved".to_string(),
        settings: defaults.masked(),
    })
    .into_response())
}

async fn send_email<E: EmailService, A: AuditLog>(
    state: &AppState<E, A>,
    session: &str,
    request_id: Uuid,
    body: EmailPostBody,
) -> Result<Response, ApiError> {
    let EmailPostBody {
        action: _,
        settings,
        to,
        subject,
        text,
        html,
        method,
    } = body;

    let method = method.unwrap_or_default();

    record_best_effort(
        state.audit.as_ref(),
        LogEntry::new(
            event::API_REQUEST,
            Some(request_id),
            json!({ "method": method, "to": &to, "subject": &subject }),
        ),
    )
    .await;

    let to = to.filter(|to| !to.is_empty());
    let subject = subject
        .as_deref()
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .map(str::to_string);
    let text = text.filter(|text| !text.trim().is_empty());
    let html = html.filter(|html| !html.trim().is_empty());

    let mut missing = Vec::new();
    if to.is_none() {
        missing.push("to");
    }
    if subject.is_none() {
        missing.push("subject");
    }
    if text.is_none() && html.is_none() {
        missing.push("text or html");
    }

    if !missing.is_empty() {
        return Err(ApiError::new_400(&format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let resolved = state.settings.resolve(session, &settings);

    let message = EmailMessage {
        to: to.expect("validated above"),
        subject: subject.expect("validated above"),
        text_body: text,
        html_body: html,
    };

    let receipt = state
        .email
        .send(request_id, &resolved, &message, method)
        .await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        message_id: receipt.message_id,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{
            audit::MockAuditLog,
            email::{MockEmailService, SendError, SendReceipt},
            settings::EmailSettings,
        },
        infrastructure::http::{
            errors::ErrorResponse,
            router,
            session::SESSION_HEADER,
            state::tests::{test_state, test_state_with_defaults},
        },
    };

    use super::*;

    fn full_defaults() -> EmailSettings {
        EmailSettings {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: "587".to_string(),
            smtp_user: "mailer".to_string(),
            smtp_pass: "envpass99".to_string(),
            from_email: "sender@example.com".to_string(),
            from_name: "Sender".to_string(),
            brevo_api_key: String::new(),
        }
    }

    fn accepting_service() -> MockEmailService {
        let mut email = MockEmailService::new();
        email.expect_send().returning(|_, _, _, _| {
            Ok(SendReceipt {
                message_id: "msg-123".to_string(),
            })
        });
        email
    }

    fn untouched_service() -> MockEmailService {
        let mut email = MockEmailService::new();
        email.expect_send().never();
        email
    }

    #[tokio::test]
    async fn test_status_without_configuration() -> TestResult {
        let state = test_state(None, None);

        let response = TestServer::new(router(state))?.get("/api/email").await;

        response.assert_status_ok();
        let json = response.json::<EmailStatusResponse>();

        assert!(json.success);
        assert_eq!(json.message, "Email API is running");
        assert!(!json.env_vars_loaded);
        assert!(json.configuration_incomplete);
        assert_eq!(json.available_actions.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_status_with_environment_masks_secrets() -> TestResult {
        let state = test_state_with_defaults(None, None, full_defaults());

        let response = TestServer::new(router(state))?.get("/api/email").await;

        response.assert_status_ok();
        let json = response.json::<EmailStatusResponse>();

        assert_eq!(json.message, "Email API is running with environment variables");
        assert!(json.env_vars_loaded);
        assert!(!json.configuration_incomplete);
        assert_ne!(json.settings.smtp_pass, "envpass99");
        assert!(json.settings.smtp_pass.contains('*'));
        assert_eq!(json.settings.smtp_host, "smtp.example.com");

        Ok(())
    }

    #[tokio::test]
    async fn test_send_with_valid_settings_returns_message_id() -> TestResult {
        let mut email = MockEmailService::new();
        email
            .expect_send()
            .withf(|_, resolved, message, method| {
                *method == SendMethod::Smtp
                    && resolved.is_complete()
                    && message.to.first() == Some("a@b.com")
                    && message.subject == "Hi"
                    && message.text_body.as_deref() == Some("hello")
            })
            .returning(|_, _, _, _| {
                Ok(SendReceipt {
                    message_id: "msg-123".to_string(),
                })
            });

        let state = test_state_with_defaults(Some(email), None, full_defaults());

        let response = TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({ "to": "a@b.com", "subject": "Hi", "text": "hello" }))
            .await;

        response.assert_status_ok();
        let json = response.json::<SendEmailResponse>();

        assert!(json.success);
        assert!(!json.message_id.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_send_without_bodies_is_rejected() -> TestResult {
        let state = test_state(Some(untouched_service()), None);

        let response = TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({ "to": "a@b.com", "subject": "Hi" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let json = response.json::<ErrorResponse>();

        assert!(!json.success);
        assert!(json.message.contains("Missing required fields"));
        assert!(json.message.contains("text or html"));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_names_every_missing_field() -> TestResult {
        let state = test_state(Some(untouched_service()), None);

        let response = TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let json = response.json::<ErrorResponse>();

        assert_eq!(
            json.message,
            "Missing required fields: to, subject, text or html"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_provider_brand_alias_routes_to_provider() -> TestResult {
        let mut email = MockEmailService::new();
        email
            .expect_send()
            .withf(|_, _, _, method| *method == SendMethod::Provider)
            .returning(|_, _, _, _| {
                Ok(SendReceipt {
                    message_id: "msg-123".to_string(),
                })
            });

        let state = test_state_with_defaults(Some(email), None, full_defaults());

        let response = TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({
                "to": "a@b.com",
                "subject": "Hi",
                "text": "hello",
                "method": "brevo",
            }))
            .await;

        response.assert_status_ok();

        Ok(())
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_500_with_detail() -> TestResult {
        let mut email = MockEmailService::new();
        email.expect_send().returning(|_, _, _, _| {
            Err(SendError::Rejected {
                status: 401,
                detail: "Unauthorized".to_string(),
            })
        });

        let state = test_state_with_defaults(Some(email), None, full_defaults());

        let response = TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({
                "to": "a@b.com",
                "subject": "Hi",
                "text": "hello",
                "method": "provider",
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response.json::<ErrorResponse>();

        assert!(!json.success);
        assert_eq!(json.message, "Failed to send email");
        assert!(json.error.as_deref().is_some_and(|e| e.contains("Unauthorized")));

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_credentials_redirect_to_settings() -> TestResult {
        let mut email = MockEmailService::new();
        email
            .expect_send()
            .returning(|_, _, _, _| Err(SendError::NotConfigured("Brevo API key")));

        let state = test_state(Some(email), None);

        let response = TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({
                "to": "a@b.com",
                "subject": "Hi",
                "text": "hello",
                "method": "provider",
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let json = response.json::<ErrorResponse>();

        assert!(json.needs_settings);
        assert_eq!(json.message, "Missing Brevo API key");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_settings_masks_response_and_persists() -> TestResult {
        let state = test_state_with_defaults(Some(untouched_service()), None, full_defaults());
        let server = TestServer::new(router(state))?;

        let response = server
            .post("/api/email")
            .json(&json!({ "action": "updateSettings", "smtpPass": "secret123" }))
            .await;

        response.assert_status_ok();
        let json = response.json::<UpdateSettingsResponse>();

        assert!(json.success);
        assert_eq!(json.message, "Settings applied for current session");
        assert_eq!(json.settings.smtp_pass, "se*****23");
        assert_eq!(json.settings.smtp_host, "smtp.example.com");

        let status = server.get("/api/email").await;
        let status_json = status.json::<EmailStatusResponse>();

        assert_eq!(status_json.settings.smtp_pass, "se*****23");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_settings_is_session_scoped() -> TestResult {
        let state = test_state_with_defaults(Some(untouched_service()), None, full_defaults());
        let server = TestServer::new(router(state))?;

        let session = HeaderName::from_static(SESSION_HEADER);

        server
            .post("/api/email")
            .add_header(session.clone(), HeaderValue::from_static("s1"))
            .json(&json!({ "action": "updateSettings", "smtpUser": "override" }))
            .await
            .assert_status_ok();

        let scoped = server
            .get("/api/email")
            .add_header(session, HeaderValue::from_static("s1"))
            .await
            .json::<EmailStatusResponse>();
        let shared = server.get("/api/email").await.json::<EmailStatusResponse>();

        assert_eq!(scoped.settings.smtp_user, "override");
        assert_eq!(shared.settings.smtp_user, "mailer");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_settings_requires_at_least_one_field() -> TestResult {
        let state = test_state(Some(untouched_service()), None);

        let response = TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({ "action": "updateSettings" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<ErrorResponse>().message,
            "No settings provided"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_update_logs_only_masked_secrets() -> TestResult {
        let mut audit = MockAuditLog::new();

        audit
            .expect_record()
            .times(2)
            .withf(|entry| {
                let payload = serde_json::to_string(&entry.data).expect("serializable payload");
                !payload.contains("secret123")
            })
            .returning(|_| Ok(()));

        let state =
            test_state_with_defaults(Some(untouched_service()), Some(audit), full_defaults());

        TestServer::new(router(state))?
            .post("/api/email")
            .json(&json!({ "action": "updateSettings", "smtpPass": "secret123" }))
            .await
            .assert_status_ok();

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_settings_is_idempotent() -> TestResult {
        let state = test_state_with_defaults(Some(untouched_service()), None, full_defaults());
        let server = TestServer::new(router(state))?;

        server
            .post("/api/email")
            .json(&json!({ "action": "updateSettings", "smtpPass": "changed99" }))
            .await
            .assert_status_ok();

        let first = server
            .post("/api/email")
            .json(&json!({ "action": "resetSettings" }))
            .await;
        let second = server
            .post("/api/email")
            .json(&json!({ "action": "resetSettings" }))
            .await;

        first.assert_status_ok();
        assert_eq!(first.text(), second.text());

        let json = first.json::<ResetSettingsResponse>();
        assert_eq!(json.message, "Current server settings retrieved");
        assert_eq!(json.settings.smtp_pass, "en*****99");

        let status = server.get("/api/email").await.json::<EmailStatusResponse>();
        assert_eq!(status.settings.smtp_pass, "en*****99");

        Ok(())
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() -> TestResult {
        let state = test_state(Some(untouched_service()), None);

        let response = TestServer::new(router(state))?.put("/api/email").await;

        assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);

        Ok(())
    }
}
