use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::identity::errors::CacheError;
use crate::identity::models::Identity;
use crate::identity::models::IdentitySnapshot;
use crate::identity::ports::IdentityCache;

/// Redis-backed identity snapshot cache.
///
/// Entries are JSON-encoded snapshots keyed by email, expired server-side via
/// `SET EX`. A snapshot that fails to decode is reported as an error, which
/// the service treats as a miss.
pub struct RedisIdentityCache {
    client: redis::Client,
}

impl RedisIdentityCache {
    /// Create a cache from a Redis connection URL.
    ///
    /// # Errors
    /// * `Unavailable` - URL could not be parsed into a client
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl IdentityCache for RedisIdentityCache {
    async fn get(&self, email: &str) -> Result<Option<Identity>, CacheError> {
        let mut conn = self.connection().await?;

        let raw: Option<String> = conn
            .get(email)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        match raw {
            Some(json) => {
                let snapshot: IdentitySnapshot = serde_json::from_str(&json)
                    .map_err(|e| CacheError::Encoding(e.to_string()))?;
                let identity = Identity::try_from(snapshot)
                    .map_err(|e| CacheError::Encoding(e.to_string()))?;
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        email: &str,
        identity: &Identity,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(&IdentitySnapshot::from(identity))
            .map_err(|e| CacheError::Encoding(e.to_string()))?;

        let mut conn = self.connection().await?;
        conn.set_ex(email, json, ttl.as_secs())
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }

    async fn invalidate(&self, email: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del(email)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }
}
