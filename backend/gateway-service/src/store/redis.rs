use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::{AppError, Result};
use crate::models::QuotaCounter;
use crate::store::CounterStore;

/// Redis-backed counter documents.
///
/// Counters are stored as whole JSON values under `quota:<key>` and
/// overwritten with SET on every call. INCR is deliberately not used: the
/// limiter's contract is a read-modify-write of the full document, and no
/// TTL is set because stale windows are reclaimed lazily on the next read.
pub struct RedisCounterStore {
    redis: ConnectionManager,
}

impl RedisCounterStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn storage_key(key: &str) -> String {
        format!("quota:{key}")
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn read(&self, key: &str) -> Result<Option<QuotaCounter>> {
        // ConnectionManager clones share the same underlying connection.
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(Self::storage_key(key)).await?;

        match raw {
            Some(json) => {
                let counter = serde_json::from_str(&json).map_err(|e| {
                    AppError::CounterStore(format!("corrupt counter for {key}: {e}"))
                })?;
                Ok(Some(counter))
            }
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, counter: &QuotaCounter) -> Result<()> {
        let mut conn = self.redis.clone();
        let json = serde_json::to_string(counter)?;
        let _: () = conn.set(Self::storage_key(key), json).await?;
        Ok(())
    }
}
