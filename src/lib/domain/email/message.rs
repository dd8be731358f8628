//! Email message types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One or more recipient addresses, as supplied on the wire: either a
/// single string or an array of strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Recipients {
    /// A single address
    One(String),

    /// A list of addresses
    Many(Vec<String>),
}

impl Recipients {
    /// The addresses in order, blanks dropped.
    pub fn addresses(&self) -> Vec<&str> {
        let raw: Vec<&str> = match self {
            Self::One(address) => vec![address.as_str()],
            Self::Many(addresses) => addresses.iter().map(String::as_str).collect(),
        };

        raw.into_iter()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .collect()
    }

    /// Whether no usable address was supplied.
    pub fn is_empty(&self) -> bool {
        self.addresses().is_empty()
    }

    /// The first usable address.
    pub fn first(&self) -> Option<&str> {
        self.addresses().first().copied()
    }

    /// All addresses joined into one comma-separated header value.
    pub fn joined(&self) -> String {
        self.addresses().join(", ")
    }
}

/// An email message constructed per request; never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address(es)
    pub to: Recipients,

    /// Subject line
    pub subject: String,

    /// Plain text body, if any
    pub text_body: Option<String>,

    /// HTML body, if any
    pub html_body: Option<String>,
}

/// Proof that a transport accepted a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendReceipt {
    /// Identifier the transport assigned to the accepted message
    pub message_id: String,
}
