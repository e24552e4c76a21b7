//! Call log stores - Redis, in-memory, and the stand-in used when neither
//! is reachable.

mod memory;
mod unavailable;

#[cfg(feature = "redis")]
mod redis;

use std::sync::Arc;
use std::time::Duration;

use qqbot_core::ports::CallLogStore;

pub use memory::InMemoryCallLogStore;
pub use unavailable::UnavailableCallLogStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisCallLogStore;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379). Unset means no store.
    pub url: Option<String>,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Keep a per-process in-memory log instead of refusing to store
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: false,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Read `REDIS_URL`, `REDIS_CONNECT_TIMEOUT_SECS` and
    /// `REDIS_FALLBACK_TO_MEMORY` from the given variables.
    ///
    /// A blank URL counts as unset; an unparsable timeout keeps the default.
    pub fn from_vars(vars: impl Iterator<Item = (String, String)>) -> Self {
        let mut config = Self::default();

        for (key, value) in vars {
            match key.as_str() {
                "REDIS_URL" if !value.trim().is_empty() => config.url = Some(value),
                "REDIS_CONNECT_TIMEOUT_SECS" => {
                    if let Ok(secs) = value.parse() {
                        config.connect_timeout = Duration::from_secs(secs);
                    }
                }
                "REDIS_FALLBACK_TO_MEMORY" => {
                    config.fallback_to_memory = value == "true" || value == "1";
                }
                _ => {}
            }
        }

        config
    }
}

/// Build the process-wide call log store.
///
/// Never fails: when Redis is not configured or cannot be reached the
/// problem is logged and an in-memory or unavailable store is returned,
/// so every later check resolves to its caller's default.
pub async fn connect_call_log_store(config: &RedisConfig) -> Arc<dyn CallLogStore> {
    let reason = match &config.url {
        None => "REDIS_URL not set".to_string(),
        Some(url) => match open_redis(url, config.connect_timeout).await {
            Ok(store) => return store,
            Err(reason) => {
                tracing::error!(url = %url, error = %reason, "Failed to connect call log store");
                reason
            }
        },
    };

    if config.fallback_to_memory {
        tracing::warn!(reason = %reason, "Using in-memory call log store (per-process limits)");
        Arc::new(InMemoryCallLogStore::new())
    } else {
        tracing::warn!(reason = %reason, "Call log store unavailable, checks will use their defaults");
        Arc::new(UnavailableCallLogStore::new(reason))
    }
}

#[cfg(feature = "redis")]
async fn open_redis(url: &str, timeout: Duration) -> Result<Arc<dyn CallLogStore>, String> {
    let store = RedisCallLogStore::new(url, timeout)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn open_redis(_url: &str, _timeout: Duration) -> Result<Arc<dyn CallLogStore>, String> {
    Err("built without the redis feature".to_string())
}
