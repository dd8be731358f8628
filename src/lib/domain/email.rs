//! Email dispatch: message types, transport seam, and the routing service.

pub mod errors;
pub mod message;
pub mod service;
pub mod transport;

pub use errors::SendError;
pub use message::{EmailMessage, Recipients, SendReceipt};
pub use service::{EmailService, EmailServiceImpl};
pub use transport::{SendMethod, Transport};

#[cfg(test)]
pub use service::MockEmailService;

#[cfg(test)]
pub use transport::MockTransport;
