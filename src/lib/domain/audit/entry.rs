//! Audit log entries and secret masking of their payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::secrets::mask_secret;

/// Event type names recorded by this service.
pub mod event {
    /// A send was attempted
    pub const EMAIL_ATTEMPT: &str = "email_attempt";

    /// A transport accepted the message
    pub const EMAIL_SUCCESS: &str = "email_success";

    /// A transport rejected or failed to deliver the message
    pub const EMAIL_ERROR: &str = "email_error";

    /// Snapshot of settings before an update
    pub const SETTINGS_UPDATE_BEFORE: &str = "settings_update_before";

    /// Snapshot of settings after an update
    pub const SETTINGS_UPDATE_AFTER: &str = "settings_update_after";

    /// Session settings were reset to environment defaults
    pub const SETTINGS_RESET: &str = "settings_reset";

    /// A send request was received
    pub const API_REQUEST: &str = "api_request";

    /// Stale per-day buckets were purged
    pub const LOG_CLEANUP: &str = "log_cleanup";
}

/// Payload keys whose values are masked before storage.
const DENY_LIST: [&str; 6] = [
    "smtpPass",
    "brevoApiKey",
    "apiKey",
    "password",
    "pass",
    "secret",
];

/// One audit log entry. The payload is masked at construction, so an entry
/// never holds a raw secret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// When the event happened
    pub timestamp: DateTime<Utc>,

    /// Event type, free-form
    #[serde(rename = "type")]
    pub kind: String,

    /// Request the event belongs to, when there is one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<Uuid>,

    /// Structured event payload, secrets masked
    #[schema(value_type = Object)]
    pub data: Value,
}

impl LogEntry {
    /// Build an entry stamped with the current time, masking any
    /// deny-listed fields in `data`.
    pub fn new(kind: &str, request_id: Option<Uuid>, data: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: kind.to_string(),
            request_id,
            data: mask_deny_listed(data),
        }
    }
}

/// Recursively mask every deny-listed field in a JSON payload. Non-string
/// values under a deny-listed key are fully redacted.
pub fn mask_deny_listed(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    if DENY_LIST.contains(&key.as_str()) {
                        let masked = match &value {
                            Value::String(s) => Value::String(mask_secret(s)),
                            Value::Null => Value::Null,
                            _ => Value::String("***".to_string()),
                        };
                        (key, masked)
                    } else {
                        (key, mask_deny_listed(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(mask_deny_listed).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_top_level_secret_is_masked() {
        let masked = mask_deny_listed(json!({ "smtpPass": "secret123", "smtpUser": "mailer" }));

        assert_eq!(masked["smtpPass"], "se*****23");
        assert_eq!(masked["smtpUser"], "mailer");
    }

    #[test]
    fn test_nested_secrets_are_masked() {
        let masked = mask_deny_listed(json!({
            "currentSettings": {
                "smtpHost": "smtp.example.com",
                "smtpPass": "secret123",
                "brevoApiKey": "xkeysib-0123456789"
            }
        }));

        assert_eq!(masked["currentSettings"]["smtpPass"], "se*****23");
        assert_eq!(masked["currentSettings"]["brevoApiKey"], "xk**************89");
        assert_eq!(masked["currentSettings"]["smtpHost"], "smtp.example.com");
    }

    #[test]
    fn test_secrets_inside_arrays_are_masked() {
        let masked = mask_deny_listed(json!([{ "apiKey": "abcdefgh" }]));

        assert_eq!(masked[0]["apiKey"], "a******h");
    }

    #[test]
    fn test_non_string_secret_is_fully_redacted() {
        let masked = mask_deny_listed(json!({ "password": 12345 }));

        assert_eq!(masked["password"], "***");
    }

    #[test]
    fn test_entry_construction_masks_payload() {
        let entry = LogEntry::new(
            event::SETTINGS_UPDATE_AFTER,
            Some(Uuid::new_v4()),
            json!({ "newSettings": { "smtpPass": "secret123" } }),
        );

        assert_eq!(entry.kind, "settings_update_after");
        assert_eq!(entry.data["newSettings"]["smtpPass"], "se*****23");
    }

    #[test]
    fn test_entry_round_trips_through_json() {
        let entry = LogEntry::new(event::EMAIL_ATTEMPT, None, json!({ "to": "a@b.com" }));

        let raw = serde_json::to_string(&entry).expect("serializable entry");
        let parsed: LogEntry = serde_json::from_str(&raw).expect("parseable entry");

        assert_eq!(parsed, entry);
        assert!(raw.contains(r#""type":"email_attempt""#));
    }
}
