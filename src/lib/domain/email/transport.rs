//! The transport seam between the dispatch service and its delivery
//! mechanisms.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::mock;

use crate::domain::{
    email::{errors::SendError, message::EmailMessage, message::SendReceipt},
    settings::EmailSettings,
};

/// Which transport a send request selects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendMethod {
    /// Direct SMTP relay
    #[default]
    Smtp,

    /// Transactional-email HTTP API
    #[serde(alias = "brevo")]
    Provider,
}

/// A mechanism capable of delivering a single email.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Deliver one message using the resolved settings. One connection or
    /// request per call; no retry.
    async fn deliver(
        &self,
        settings: &EmailSettings,
        message: &EmailMessage,
    ) -> Result<SendReceipt, SendError>;

    /// Short transport name used in log entries.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mock! {
    pub Transport {}

    #[async_trait]
    impl Transport for Transport {
        async fn deliver(
            &self,
            settings: &EmailSettings,
            message: &EmailMessage,
        ) -> Result<SendReceipt, SendError>;

        fn name(&self) -> &'static str;
    }
}
