use super::distributed::{KvClient, WatchFn};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Redis-backed key-value client (for production)
///
/// Transactions use `WATCH` / `MULTI` / `EXEC` on a dedicated connection, so a
/// watch set up by one update can never be cleared by another.
#[derive(Debug, Clone)]
pub struct RedisKv {
    client: redis::Client,
}

impl RedisKv {
    /// Create a new Redis client
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    #[must_use]
    pub fn from_client(client: redis::Client) -> Self {
        Self { client }
    }

    /// Get an async connection
    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Backend(format!("Redis connection failed: {}", e)))
    }
}

fn set_command(key: &str, value: &[u8], ttl: Option<Duration>) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if let Some(ttl) = ttl {
        // PX rejects 0
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        cmd.arg("PX").arg(millis);
    }
    cmd
}

#[async_trait]
impl KvClient for RedisKv {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;

        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Redis GET failed: {}", e)))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;

        set_command(key, &value, ttl)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Redis SET failed: {}", e)))
    }

    async fn watch(
        &self,
        key: &str,
        ttl: Option<Duration>,
        apply: &mut WatchFn<'_>,
    ) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("WATCH")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Redis WATCH failed: {}", e)))?;

        let current: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Redis GET failed: {}", e)))?;

        let payload = match apply(current.as_deref()) {
            Ok(payload) => payload,
            Err(e) => {
                let _: Result<(), _> = redis::cmd("UNWATCH").query_async(&mut conn).await;
                return Err(e);
            }
        };

        let mut pipe = redis::pipe();
        pipe.atomic().add_command(set_command(key, &payload, ttl)).ignore();

        // EXEC replies nil when a watched key changed
        let committed: Option<()> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(format!("Redis EXEC failed: {}", e)))?;

        match committed {
            Some(()) => Ok(()),
            None => {
                debug!(key = %key, "Redis transaction aborted by concurrent write");
                Err(StoreError::Conflict {
                    key: key.to_string(),
                    attempts: 1,
                })
            }
        }
    }
}
