//! The dispatch router: picks a transport per request and records the
//! attempt and its outcome around the delivery call.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use crate::domain::{
    audit::{event, AuditLog, LogEntry},
    email::{
        errors::SendError,
        message::{EmailMessage, SendReceipt},
        transport::{SendMethod, Transport},
    },
    settings::ResolvedSettings,
};

/// Email dispatch service.
#[async_trait]
pub trait EmailService: Send + Sync + 'static {
    /// Deliver one message through the selected transport.
    async fn send(
        &self,
        request_id: Uuid,
        resolved: &ResolvedSettings,
        message: &EmailMessage,
        method: SendMethod,
    ) -> Result<SendReceipt, SendError>;
}

#[cfg(test)]
mock! {
    pub EmailService {}

    #[async_trait]
    impl EmailService for EmailService {
        async fn send(
            &self,
            request_id: Uuid,
            resolved: &ResolvedSettings,
            message: &EmailMessage,
            method: SendMethod,
        ) -> Result<SendReceipt, SendError>;
    }
}

/// Email dispatch service implementation over two transports and an audit
/// log.
#[derive(Debug)]
pub struct EmailServiceImpl<S, P, A>
where
    S: Transport,
    P: Transport,
    A: AuditLog,
{
    smtp: S,
    provider: P,
    audit: Arc<A>,
}

impl<S, P, A> EmailServiceImpl<S, P, A>
where
    S: Transport,
    P: Transport,
    A: AuditLog,
{
    /// Create a new dispatch service.
    pub fn new(smtp: S, provider: P, audit: Arc<A>) -> Self {
        Self {
            smtp,
            provider,
            audit,
        }
    }

    async fn record(&self, entry: LogEntry) {
        if let Err(err) = self.audit.record(entry).await {
            warn!(error = %err, "failed to record audit event");
        }
    }
}

#[async_trait]
impl<S, P, A> EmailService for EmailServiceImpl<S, P, A>
where
    S: Transport,
    P: Transport,
    A: AuditLog,
{
    async fn send(
        &self,
        request_id: Uuid,
        resolved: &ResolvedSettings,
        message: &EmailMessage,
        method: SendMethod,
    ) -> Result<SendReceipt, SendError> {
        let transport: &dyn Transport = match method {
            SendMethod::Smtp => &self.smtp,
            SendMethod::Provider => &self.provider,
        };

        let settings = &resolved.settings;

        self.record(LogEntry::new(
            event::EMAIL_ATTEMPT,
            Some(request_id),
            json!({
                "method": transport.name(),
                "to": message.to.joined(),
                "subject": &message.subject,
                "settings": {
                    "host": &settings.smtp_host,
                    "port": &settings.smtp_port,
                    "user": &settings.smtp_user,
                    "from": &settings.from_email,
                },
            }),
        ))
        .await;

        match transport.deliver(settings, message).await {
            Ok(receipt) => {
                self.record(LogEntry::new(
                    event::EMAIL_SUCCESS,
                    Some(request_id),
                    json!({
                        "method": transport.name(),
                        "messageId": &receipt.message_id,
                    }),
                ))
                .await;

                Ok(receipt)
            }
            Err(err) => {
                self.record(LogEntry::new(
                    event::EMAIL_ERROR,
                    Some(request_id),
                    json!({
                        "method": transport.name(),
                        "error": err.to_string(),
                    }),
                ))
                .await;

                Err(err)
            }
        }
    }
}
