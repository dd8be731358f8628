//! Redis-backed audit log.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use clap::Parser;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::domain::audit::{event, AuditError, AuditLog, LogEntry};

/// Store connection details.
#[derive(Debug, Clone, Parser)]
pub struct RedisConfig {
    /// The Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,
}

/// Log bucket keys.
mod keys {
    use chrono::NaiveDate;

    pub const PREFIX: &str = "logs:";
    pub const RECENT: &str = "logs:recent";

    pub fn day(date: NaiveDate) -> String {
        format!("{PREFIX}{date}")
    }
}

/// Cap on the recent list: the most recently pushed entries are kept.
const RECENT_CAP: isize = 100;

/// Audit log persisted in Redis: one list per UTC day plus a capped recent
/// list. The connection is created lazily on first use and reused; a
/// connection error surfaces to the operation that triggered it.
pub struct RedisAuditLog {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl std::fmt::Debug for RedisAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisAuditLog").finish_non_exhaustive()
    }
}

impl RedisAuditLog {
    /// Create a handle over the configured store. No connection is opened
    /// here.
    pub fn open(config: &RedisConfig) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(config.redis_url.as_str())?,
            conn: OnceCell::new(),
        })
    }

    async fn manager(&self) -> Result<ConnectionManager, AuditError> {
        self.conn
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await
            .cloned()
            .map_err(|e| AuditError::Unavailable(e.to_string()))
    }
}

fn unavailable(e: redis::RedisError) -> AuditError {
    AuditError::Unavailable(e.to_string())
}

#[async_trait]
impl AuditLog for RedisAuditLog {
    async fn record(&self, entry: LogEntry) -> Result<(), AuditError> {
        let payload = serde_json::to_string(&entry)?;
        let mut conn = self.manager().await?;

        let day = keys::day(entry.timestamp.date_naive());
        let _: () = conn.rpush(&day, &payload).await.map_err(unavailable)?;
        let _: () = conn
            .rpush(keys::RECENT, &payload)
            .await
            .map_err(unavailable)?;
        let _: () = conn
            .ltrim(keys::RECENT, -RECENT_CAP, -1)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, AuditError> {
        let mut conn = self.manager().await?;

        let raw: Vec<String> = conn
            .lrange(keys::RECENT, -(limit as isize), -1)
            .await
            .map_err(unavailable)?;

        // Newest first; entries that no longer parse are skipped rather
        // than failing the read.
        Ok(raw
            .iter()
            .rev()
            .filter_map(|item| serde_json::from_str(item).ok())
            .collect())
    }

    async fn purge_stale(&self) -> Result<Vec<String>, AuditError> {
        let mut conn = self.manager().await?;

        let bucket_keys: Vec<String> = redis::cmd("KEYS")
            .arg(format!("{}*", keys::PREFIX))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        let cutoff = Utc::now().date_naive() - Days::new(1);
        let mut deleted = Vec::new();

        for key in bucket_keys {
            if key == keys::RECENT {
                continue;
            }

            let Some(date) = key.strip_prefix(keys::PREFIX) else {
                continue;
            };
            let Ok(date) = date.parse::<NaiveDate>() else {
                continue;
            };

            // Today and yesterday are retained.
            if date >= cutoff {
                continue;
            }

            let _: () = conn.del(&key).await.map_err(unavailable)?;
            deleted.push(key);
        }

        let cleanup = LogEntry::new(
            event::LOG_CLEANUP,
            None,
            json!({
                "deletedKeys": &deleted,
                "retainedSince": cutoff.to_string(),
            }),
        );
        if let Err(err) = self.record(cleanup).await {
            warn!(error = %err, "failed to record cleanup event");
        }

        Ok(deleted)
    }
}
