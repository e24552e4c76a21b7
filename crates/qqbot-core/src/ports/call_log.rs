//! Call log storage port.

use std::time::Duration;

use async_trait::async_trait;

/// Safety expiry put on every rewritten call log.
pub const CALL_LOG_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// Call log store - ordered lists of timestamps keyed by rate-limit key.
///
/// Entries are handed back exactly as stored; parsing is the caller's job
/// so corrupt data can be skipped rather than failing the whole read.
#[async_trait]
pub trait CallLogStore: Send + Sync {
    /// Every entry stored under `key`, oldest first. Missing key is empty.
    async fn fetch(&self, key: &str) -> Result<Vec<String>, CallLogError>;

    /// Replace the whole list under `key` with `entries` and set `ttl` on
    /// the key. Delete, insert and expiry apply as one batch.
    async fn replace(&self, key: &str, entries: &[String], ttl: Duration)
    -> Result<(), CallLogError>;

    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;
}

/// Call log store errors.
#[derive(Debug, thiserror::Error)]
pub enum CallLogError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
