//! SMTP transport built on lettre.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::domain::{
    email::{EmailMessage, SendError, SendReceipt, Transport},
    settings::EmailSettings,
};

/// Implicit-TLS SMTP port; any other port gets a plain connection.
const SMTPS_PORT: u16 = 465;

/// SMTP transport. Opens one connection per delivery, no pooling.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmtpTransport;

impl SmtpTransport {
    /// Create a new SMTP transport.
    pub fn new() -> Self {
        Self
    }

    fn relay(
        settings: &EmailSettings,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, SendError> {
        let host = settings.smtp_host.trim();
        if host.is_empty() {
            return Err(SendError::NotConfigured("SMTP host"));
        }

        let port: u16 = settings.smtp_port.trim().parse().map_err(|_| {
            SendError::InvalidConfiguration(format!(
                "invalid SMTP port \"{}\"",
                settings.smtp_port
            ))
        })?;

        // TLS is derived from the port: 465 is wrapped, everything else is a
        // plain connection.
        let mut builder = if port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| SendError::InvalidConfiguration(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        builder = builder.port(port);

        let user = settings.smtp_user.trim();
        let pass = settings.smtp_pass.trim();
        if !user.is_empty() && !pass.is_empty() {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(builder.build())
    }

    fn build_message(
        settings: &EmailSettings,
        message: &EmailMessage,
    ) -> Result<Message, SendError> {
        let from: Mailbox = format!("{} <{}>", settings.from_name, settings.from_email)
            .parse()
            .map_err(|e| {
                SendError::InvalidConfiguration(format!("invalid from address: {e}"))
            })?;

        let mut builder = Message::builder()
            .from(from)
            .subject(message.subject.clone());

        // Every recipient is addressed here; the provider transport only
        // takes the first.
        for address in message.to.addresses() {
            let mailbox: Mailbox = address.parse().map_err(|e| {
                SendError::Failed(format!("invalid recipient address \"{address}\": {e}"))
            })?;
            builder = builder.to(mailbox);
        }

        match (&message.text_body, &message.html_body) {
            (Some(text), Some(html)) => builder
                .multipart(MultiPart::alternative_plain_html(
                    text.clone(),
                    html.clone(),
                ))
                .map_err(|e| SendError::Failed(e.to_string())),
            (Some(text), None) => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.clone())
                .map_err(|e| SendError::Failed(e.to_string())),
            (None, Some(html)) => builder
                .header(ContentType::TEXT_HTML)
                .body(html.clone())
                .map_err(|e| SendError::Failed(e.to_string())),
            (None, None) => Err(SendError::Failed("message has no body".to_string())),
        }
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn deliver(
        &self,
        settings: &EmailSettings,
        message: &EmailMessage,
    ) -> Result<SendReceipt, SendError> {
        let relay = Self::relay(settings)?;
        let email = Self::build_message(settings, message)?;

        match relay.send(email).await {
            Ok(response) => {
                let message_id = response
                    .message()
                    .next()
                    .map(str::to_string)
                    .unwrap_or_else(|| "accepted".to_string());

                Ok(SendReceipt { message_id })
            }
            Err(e) => {
                let detail = e.to_string();
                if detail.contains("authentication") || detail.contains("AUTH") {
                    Err(SendError::Authentication(detail))
                } else if detail.contains("connection") || detail.contains("timeout") {
                    Err(SendError::Connection(detail))
                } else {
                    Err(SendError::Failed(detail))
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
