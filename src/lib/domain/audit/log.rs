//! The audit log seam.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::mock;

use crate::domain::audit::entry::LogEntry;

/// An error raised by the audit store. Callers never fail their primary
/// operation over one of these; they log a diagnostic and move on.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The store could not be reached
    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    /// The entry could not be serialized
    #[error("audit entry not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Best-effort recorder of structured events.
#[async_trait]
pub trait AuditLog: Send + Sync + 'static {
    /// Append an entry to the per-day bucket and the capped recent list.
    async fn record(&self, entry: LogEntry) -> Result<(), AuditError>;

    /// The most recent entries, newest first, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, AuditError>;

    /// Delete per-day buckets older than yesterday, returning the deleted
    /// keys.
    async fn purge_stale(&self) -> Result<Vec<String>, AuditError>;
}

#[cfg(test)]
mock! {
    pub AuditLog {}

    #[async_trait]
    impl AuditLog for AuditLog {
        async fn record(&self, entry: LogEntry) -> Result<(), AuditError>;
        async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, AuditError>;
        async fn purge_stale(&self) -> Result<Vec<String>, AuditError>;
    }
}
