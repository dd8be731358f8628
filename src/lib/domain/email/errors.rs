//! Error types for email dispatch.

use thiserror::Error;

/// An error raised while dispatching one message. Carries a kind and a
/// detail; no variant is retried or escalated differently by subtype.
#[derive(Debug, Error)]
pub enum SendError {
    /// A credential or connection parameter required by the selected
    /// transport is absent
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The resolved configuration cannot be used as-is
    #[error("invalid email configuration: {0}")]
    InvalidConfiguration(String),

    /// The transport could not reach its peer
    #[error("connection error: {0}")]
    Connection(String),

    /// The peer refused the configured credentials
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The provider answered with a non-success status
    #[error("provider rejected the request with status {status}: {detail}")]
    Rejected {
        /// HTTP status the provider returned
        status: u16,

        /// Sanitized detail extracted from the provider's response
        detail: String,
    },

    /// Any other transport failure
    #[error("send failed: {0}")]
    Failed(String),
}
