//! Transport implementations: SMTP relay and the Brevo HTTP API.

pub mod brevo;
pub mod smtp;

pub use brevo::BrevoTransport;
pub use smtp::SmtpTransport;
