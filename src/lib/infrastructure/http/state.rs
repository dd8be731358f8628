//! Application state module

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{audit::AuditLog, email::EmailService, settings::SettingsProvider};

/// Application configuration
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    /// Bearer token authorizing the log-cleanup endpoint
    pub cron_secret: Option<String>,
}

/// Global application state
pub struct AppState<E: EmailService, A: AuditLog> {
    /// The time the server started
    pub start_time: DateTime<Utc>,

    /// The application configuration
    pub config: AppConfig,

    /// Settings provider
    pub settings: Arc<SettingsProvider>,

    /// Email dispatch service
    pub email: Arc<E>,

    /// Audit log
    pub audit: Arc<A>,
}

impl<E: EmailService, A: AuditLog> AppState<E, A> {
    /// Create a new application state
    pub fn new(config: AppConfig, settings: SettingsProvider, email: E, audit: Arc<A>) -> Self {
        Self {
            start_time: Utc::now(),
            config,
            settings: Arc::new(settings),
            email: Arc::new(email),
            audit,
        }
    }
}

impl<E: EmailService, A: AuditLog> Clone for AppState<E, A> {
    fn clone(&self) -> Self {
        Self {
            start_time: self.start_time,
            config: self.config.clone(),
            settings: Arc::clone(&self.settings),
            email: Arc::clone(&self.email),
            audit: Arc::clone(&self.audit),
        }
    }
}

impl<E: EmailService, A: AuditLog> fmt::Debug for AppState<E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("email", &"EmailService")
            .field("audit", &"AuditLog")
            .finish()
    }
}
