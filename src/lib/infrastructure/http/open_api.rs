//! OpenAPI module

use utoipa::OpenApi;

use crate::domain::{
    audit::LogEntry,
    settings::{EmailSettings, SettingsPatch},
};
use crate::infrastructure::http::{errors::ErrorResponse, handlers::*};

/// OpenAPI documentation for the service.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Mailroom"),
    paths(
        index::handler,
        email::status_handler,
        email::action_handler,
        env::handler,
        logs::record_handler,
        logs::recent_handler,
        cleanup::handler,
    ),
    components(schemas(
        index::IndexResponse,
        index::EndpointInfo,
        email::EmailStatusResponse,
        email::EmailPostBody,
        email::ActionInfo,
        email::UpdateSettingsResponse,
        email::ResetSettingsResponse,
        email::SendEmailResponse,
        env::EnvResponse,
        logs::RecordLogBody,
        logs::RecordLogResponse,
        logs::RecentLogsResponse,
        cleanup::CleanupResponse,
        EmailSettings,
        SettingsPatch,
        LogEntry,
        ErrorResponse,
    ))
)]
pub struct ApiDocs;
