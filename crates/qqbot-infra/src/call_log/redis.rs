//! Redis call log store: one list per key, rewritten in a MULTI/EXEC
//! pipeline.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use qqbot_core::ports::{CallLogError, CallLogStore};

/// Redis-backed call log store.
///
/// Uses connection manager for automatic reconnection.
pub struct RedisCallLogStore {
    conn: ConnectionManager,
}

impl RedisCallLogStore {
    pub async fn new(url: &str, connect_timeout: Duration) -> Result<Self, CallLogError> {
        let client = Client::open(url).map_err(|e| CallLogError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CallLogError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CallLogError::Connection(e.to_string()))?;

        tracing::info!(url = %url, "Connected to Redis call log store");

        Ok(Self { conn })
    }
}

#[async_trait]
impl CallLogStore for RedisCallLogStore {
    async fn fetch(&self, key: &str) -> Result<Vec<String>, CallLogError> {
        let mut conn = self.conn.clone();
        let entries: Vec<String> = conn
            .lrange(key, 0, -1)
            .await
            .map_err(|e| CallLogError::Operation(e.to_string()))?;
        Ok(entries)
    }

    async fn replace(
        &self,
        key: &str,
        entries: &[String],
        ttl: Duration,
    ) -> Result<(), CallLogError> {
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !entries.is_empty() {
            pipe.rpush(key, entries.to_vec())
                .ignore()
                .expire(key, ttl.as_secs() as i64)
                .ignore();
        }

        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| CallLogError::Operation(e.to_string()))?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
