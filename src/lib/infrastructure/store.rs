//! Key-value store adapters.

pub mod redis;

pub use self::redis::{RedisAuditLog, RedisConfig};
