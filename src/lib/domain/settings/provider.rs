//! Layered resolution of effective email configuration.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::settings::{
    EmailSettings, ResolvedSettings, SettingsPatch, FALLBACK_FROM_EMAIL, FALLBACK_FROM_NAME,
};

/// Session key used when a request carries no session identifier.
pub const DEFAULT_SESSION: &str = "default";

/// Before/after snapshots of one settings update, for audit logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsChange {
    /// Effective settings before the update
    pub before: EmailSettings,

    /// Effective settings after the update
    pub after: EmailSettings,
}

/// Resolves effective configuration from layered sources. Precedence,
/// highest first: request overrides, session settings stored by a prior
/// update, environment defaults captured at process start, hard-coded
/// sender-identity fallbacks.
#[derive(Debug)]
pub struct SettingsProvider {
    defaults: EmailSettings,
    sessions: RwLock<HashMap<String, EmailSettings>>,
}

impl SettingsProvider {
    /// Create a provider over the given environment defaults.
    pub fn new(defaults: EmailSettings) -> Self {
        Self {
            defaults,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The environment-default layer.
    pub fn env_defaults(&self) -> &EmailSettings {
        &self.defaults
    }

    /// Whether the environment-default layer alone covers every required
    /// field.
    pub fn env_complete(&self) -> bool {
        self.defaults.is_complete()
    }

    fn session_base(&self, session: &str) -> EmailSettings {
        self.sessions
            .read()
            .expect("settings lock poisoned")
            .get(session)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    /// Resolve the effective settings for one request. Missing required
    /// fields are reported, never raised as an error.
    pub fn resolve(&self, session: &str, overrides: &SettingsPatch) -> ResolvedSettings {
        let mut settings = self.session_base(session);
        overrides.apply_to(&mut settings);

        let missing = settings.missing_fields();

        if settings.from_name.trim().is_empty() {
            settings.from_name = FALLBACK_FROM_NAME.to_string();
        }
        if settings.from_email.trim().is_empty() {
            settings.from_email = FALLBACK_FROM_EMAIL.to_string();
        }

        ResolvedSettings { settings, missing }
    }

    /// Apply a partial update to the session's settings, returning the
    /// before/after snapshots.
    pub fn apply(&self, session: &str, patch: &SettingsPatch) -> SettingsChange {
        let before = self.session_base(session);
        let mut after = before.clone();
        patch.apply_to(&mut after);

        self.sessions
            .write()
            .expect("settings lock poisoned")
            .insert(session.to_string(), after.clone());

        SettingsChange { before, after }
    }

    /// Drop the session's overrides and return the pure environment
    /// defaults.
    pub fn reset(&self, session: &str) -> EmailSettings {
        self.sessions
            .write()
            .expect("settings lock poisoned")
            .remove(session);

        self.defaults.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_defaults() -> EmailSettings {
        EmailSettings {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: "587".to_string(),
            smtp_user: "mailer".to_string(),
            smtp_pass: "envpass99".to_string(),
            from_email: "sender@example.com".to_string(),
            from_name: "Sender".to_string(),
            brevo_api_key: String::new(),
        }
    }

    #[test]
    fn test_resolve_uses_env_defaults_when_nothing_else_is_set() {
        let provider = SettingsProvider::new(env_defaults());

        let resolved = provider.resolve(DEFAULT_SESSION, &SettingsPatch::default());

        assert!(resolved.is_complete());
        assert_eq!(resolved.settings, env_defaults());
    }

    #[test]
    fn test_request_overrides_beat_session_and_env() {
        let provider = SettingsProvider::new(env_defaults());

        provider.apply(
            "s1",
            &SettingsPatch {
                smtp_host: Some("session.example.com".to_string()),
                ..SettingsPatch::default()
            },
        );

        let resolved = provider.resolve(
            "s1",
            &SettingsPatch {
                smtp_host: Some("request.example.com".to_string()),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(resolved.settings.smtp_host, "request.example.com");
    }

    #[test]
    fn test_blank_override_does_not_shadow_lower_layers() {
        let provider = SettingsProvider::new(env_defaults());

        let resolved = provider.resolve(
            DEFAULT_SESSION,
            &SettingsPatch {
                smtp_host: Some("   ".to_string()),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(resolved.settings.smtp_host, "smtp.example.com");
    }

    #[test]
    fn test_updating_only_password_keeps_other_fields() {
        let provider = SettingsProvider::new(env_defaults());

        let change = provider.apply(
            DEFAULT_SESSION,
            &SettingsPatch {
                smtp_pass: Some("newpass77".to_string()),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(change.before.smtp_pass, "envpass99");
        assert_eq!(change.after.smtp_pass, "newpass77");

        let resolved = provider.resolve(DEFAULT_SESSION, &SettingsPatch::default());
        assert_eq!(resolved.settings.smtp_pass, "newpass77");
        assert_eq!(resolved.settings.smtp_host, "smtp.example.com");
        assert_eq!(resolved.settings.from_email, "sender@example.com");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let provider = SettingsProvider::new(env_defaults());

        provider.apply(
            "s1",
            &SettingsPatch {
                smtp_user: Some("other".to_string()),
                ..SettingsPatch::default()
            },
        );

        let resolved = provider.resolve("s2", &SettingsPatch::default());

        assert_eq!(resolved.settings.smtp_user, "mailer");
    }

    #[test]
    fn test_missing_fields_reported_not_raised() {
        let provider = SettingsProvider::new(EmailSettings::default());

        let resolved = provider.resolve(DEFAULT_SESSION, &SettingsPatch::default());

        assert!(!resolved.is_complete());
        assert!(resolved.missing.contains(&"smtpHost"));
        assert!(resolved.missing.contains(&"smtpPass"));
    }

    #[test]
    fn test_sender_fallbacks_apply_after_missing_is_computed() {
        let provider = SettingsProvider::new(EmailSettings::default());

        let resolved = provider.resolve(DEFAULT_SESSION, &SettingsPatch::default());

        assert_eq!(resolved.settings.from_name, FALLBACK_FROM_NAME);
        assert_eq!(resolved.settings.from_email, FALLBACK_FROM_EMAIL);
        assert!(resolved.missing.contains(&"fromName"));
        assert!(resolved.missing.contains(&"fromEmail"));
    }

    #[test]
    fn test_reset_drops_session_overrides() {
        let provider = SettingsProvider::new(env_defaults());

        provider.apply(
            "s1",
            &SettingsPatch {
                smtp_pass: Some("changed".to_string()),
                ..SettingsPatch::default()
            },
        );

        let first = provider.reset("s1");
        let second = provider.reset("s1");

        assert_eq!(first, env_defaults());
        assert_eq!(first, second, "reset should be idempotent");

        let resolved = provider.resolve("s1", &SettingsPatch::default());
        assert_eq!(resolved.settings.smtp_pass, "envpass99");
    }
}
