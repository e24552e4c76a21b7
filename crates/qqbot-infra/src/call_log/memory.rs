//! In-memory call log store - used when Redis is unavailable.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use qqbot_core::ports::{CallLogError, CallLogStore};

struct LogEntry {
    values: Vec<String>,
    expires_at: Instant,
}

/// Call logs kept in a HashMap behind an async RwLock.
///
/// Limits are per-process and lost on restart.
pub struct InMemoryCallLogStore {
    store: RwLock<HashMap<String, LogEntry>>,
}

impl InMemoryCallLogStore {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCallLogStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes `key` only if it is still expired at `now`.
///
/// The read lock is released before eviction, so a `replace` may have
/// stored a fresh list in between.
fn evict_if_expired(store: &mut HashMap<String, LogEntry>, key: &str, now: Instant) -> bool {
    if store.get(key).is_some_and(|entry| now > entry.expires_at) {
        store.remove(key);
        return true;
    }
    false
}

#[async_trait]
impl CallLogStore for InMemoryCallLogStore {
    async fn fetch(&self, key: &str) -> Result<Vec<String>, CallLogError> {
        let store = self.store.read().await;
        let Some(entry) = store.get(key) else {
            return Ok(Vec::new());
        };

        if Instant::now() > entry.expires_at {
            drop(store);
            evict_if_expired(&mut *self.store.write().await, key, Instant::now());
            return Ok(Vec::new());
        }

        Ok(entry.values.clone())
    }

    async fn replace(
        &self,
        key: &str,
        entries: &[String],
        ttl: Duration,
    ) -> Result<(), CallLogError> {
        let mut store = self.store.write().await;

        if entries.is_empty() {
            store.remove(key);
        } else {
            store.insert(
                key.to_string(),
                LogEntry {
                    values: entries.to_vec(),
                    expires_at: Instant::now() + ttl,
                },
            );
        }

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
