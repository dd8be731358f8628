//! Brevo transactional-email HTTP transport.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::domain::{
    email::{EmailMessage, SendError, SendReceipt, Transport},
    settings::EmailSettings,
};

/// Production endpoint base.
pub const DEFAULT_BASE_URL: &str = "https://api.brevo.com/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest provider error snippet exposed to clients.
const DETAIL_LIMIT: usize = 200;

/// HTTP transport for the Brevo transactional-email API. One POST per
/// delivery, no retry, no rate-limit handling.
#[derive(Clone, Debug)]
pub struct BrevoTransport {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct Party<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Party<'a>,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<&'a str>,
}

impl BrevoTransport {
    /// Create a transport against the given endpoint base.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

/// Extract a client-safe detail from a provider error body: its structured
/// `message` field when the body is JSON, a bounded snippet otherwise.
fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(message) = parsed.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let snippet: String = body.chars().take(DETAIL_LIMIT).collect();
    let snippet = snippet.trim();

    if snippet.is_empty() {
        "no response body".to_string()
    } else {
        snippet.to_string()
    }
}

#[async_trait]
impl Transport for BrevoTransport {
    async fn deliver(
        &self,
        settings: &EmailSettings,
        message: &EmailMessage,
    ) -> Result<SendReceipt, SendError> {
        let api_key = settings.brevo_api_key.trim();
        if api_key.is_empty() {
            return Err(SendError::NotConfigured("Brevo API key"));
        }

        // TODO: only the first recipient is delivered to; confirm whether
        // multi-recipient sends should fan out before changing this.
        let Some(first) = message.to.first() else {
            return Err(SendError::Failed("no recipients specified".to_string()));
        };

        let payload = SendEmailRequest {
            sender: Party {
                name: &settings.from_name,
                email: &settings.from_email,
            },
            to: vec![Recipient { email: first }],
            subject: &message.subject,
            html_content: message.html_body.as_deref(),
            text_content: message.text_body.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/smtp/email", self.base_url))
            .header("accept", "application/json")
            .header("api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SendError::Connection(e.to_string()))?;

        if !status.is_success() {
            error!(status = %status, body = %body, "provider rejected the message");

            return Err(SendError::Rejected {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let message_id = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|parsed| {
                parsed
                    .get("messageId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "accepted".to_string());

        Ok(SendReceipt { message_id })
    }

    fn name(&self) -> &'static str {
        "brevo"
    }
}
