//! Email configuration types and the layered settings provider.

use clap::Parser;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::secrets::mask_secret;

pub mod provider;

pub use provider::{SettingsChange, SettingsProvider, DEFAULT_SESSION};

/// Required configuration fields, by wire name.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "smtpHost",
    "smtpPort",
    "smtpUser",
    "smtpPass",
    "fromEmail",
    "fromName",
];

/// Hard-coded sender identity used when no layer supplies one.
pub const FALLBACK_FROM_NAME: &str = "Email Service";

/// Hard-coded sender address used when no layer supplies one.
pub const FALLBACK_FROM_EMAIL: &str = "noreply@example.com";

/// Effective email configuration. Every field is a string and defaults to
/// empty; absence is reported through [`ResolvedSettings::missing`], never as
/// an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailSettings {
    /// SMTP relay hostname
    pub smtp_host: String,

    /// SMTP relay port, kept as a string and parsed at send time
    pub smtp_port: String,

    /// SMTP username
    pub smtp_user: String,

    /// SMTP password
    pub smtp_pass: String,

    /// Sender address
    pub from_email: String,

    /// Sender display name
    pub from_name: String,

    /// API key for the Brevo transactional-email API
    pub brevo_api_key: String,
}

impl EmailSettings {
    /// Copy of these settings with secret fields masked for display.
    pub fn masked(&self) -> Self {
        Self {
            smtp_pass: mask_secret(&self.smtp_pass),
            brevo_api_key: mask_secret(&self.brevo_api_key),
            ..self.clone()
        }
    }

    fn field(&self, name: &str) -> &str {
        match name {
            "smtpHost" => &self.smtp_host,
            "smtpPort" => &self.smtp_port,
            "smtpUser" => &self.smtp_user,
            "smtpPass" => &self.smtp_pass,
            "fromEmail" => &self.from_email,
            "fromName" => &self.from_name,
            "brevoApiKey" => &self.brevo_api_key,
            _ => "",
        }
    }

    /// Wire names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|name| self.field(name).trim().is_empty())
            .collect()
    }

    /// Whether every required field is present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A partial settings update. A field counts as supplied only when it is
/// non-empty after trimming.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    /// SMTP relay hostname
    pub smtp_host: Option<String>,

    /// SMTP relay port
    pub smtp_port: Option<String>,

    /// SMTP username
    pub smtp_user: Option<String>,

    /// SMTP password
    pub smtp_pass: Option<String>,

    /// Sender address
    pub from_email: Option<String>,

    /// Sender display name
    pub from_name: Option<String>,

    /// Brevo API key
    pub brevo_api_key: Option<String>,
}

impl SettingsPatch {
    fn entries(&self) -> [(&Option<String>, fn(&mut EmailSettings) -> &mut String); 7] {
        [
            (&self.smtp_host, |s| &mut s.smtp_host),
            (&self.smtp_port, |s| &mut s.smtp_port),
            (&self.smtp_user, |s| &mut s.smtp_user),
            (&self.smtp_pass, |s| &mut s.smtp_pass),
            (&self.from_email, |s| &mut s.from_email),
            (&self.from_name, |s| &mut s.from_name),
            (&self.brevo_api_key, |s| &mut s.brevo_api_key),
        ]
    }

    /// Whether no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.entries()
            .into_iter()
            .all(|(value, _)| supplied(value).is_none())
    }

    /// Overlay the supplied fields onto `settings`, trimming each value.
    pub fn apply_to(&self, settings: &mut EmailSettings) {
        for (value, slot) in self.entries() {
            if let Some(value) = supplied(value) {
                *slot(settings) = value.to_string();
            }
        }
    }
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
}

/// The outcome of resolving configuration for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// The layered settings, with sender-identity fallbacks applied.
    pub settings: EmailSettings,

    /// Required fields no layer supplied, by wire name.
    pub missing: Vec<&'static str>,
}

impl ResolvedSettings {
    /// Whether every required field was supplied by some layer.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Environment-supplied configuration defaults, read once at process start.
#[derive(Clone, Debug, Default, Parser)]
pub struct EnvSettings {
    /// The SMTP relay host
    #[clap(long, env = "SMTP_HOST", default_value = "")]
    pub smtp_host: String,

    /// The SMTP relay port
    #[clap(long, env = "SMTP_PORT", default_value = "")]
    pub smtp_port: String,

    /// The SMTP username
    #[clap(long, env = "SMTP_USER", default_value = "")]
    pub smtp_user: String,

    /// The SMTP password
    #[clap(long, env = "SMTP_PASS", default_value = "")]
    pub smtp_pass: String,

    /// The sender email address
    #[clap(long, env = "FROM_EMAIL", default_value = "")]
    pub from_email: String,

    /// The sender display name
    #[clap(long, env = "FROM_NAME", default_value = "")]
    pub from_name: String,

    /// The Brevo API key
    #[clap(long, env = "BREVO_API_KEY", default_value = "")]
    pub brevo_api_key: String,
}

impl From<EnvSettings> for EmailSettings {
    fn from(env: EnvSettings) -> Self {
        Self {
            smtp_host: env.smtp_host,
            smtp_port: env.smtp_port,
            smtp_user: env.smtp_user,
            smtp_pass: env.smtp_pass,
            from_email: env.from_email,
            from_name: env.from_name,
            brevo_api_key: env.brevo_api_key,
        }
    }
}
