use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::identity::errors::CacheError;
use crate::identity::models::Identity;
use crate::identity::models::IdentitySnapshot;
use crate::identity::ports::IdentityCache;

/// In-memory identity snapshot cache for tests and single-process runs.
///
/// Stores the same JSON encoding as the Redis adapter so both paths exercise
/// the snapshot codec. Expired entries are dropped lazily on read.
pub struct InMemoryIdentityCache {
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    json: String,
    expires_at: Instant,
}

impl InMemoryIdentityCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryIdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityCache for InMemoryIdentityCache {
    async fn get(&self, email: &str) -> Result<Option<Identity>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(email) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    let snapshot: IdentitySnapshot = serde_json::from_str(&entry.json)
                        .map_err(|e| CacheError::Encoding(e.to_string()))?;
                    let identity = Identity::try_from(snapshot)
                        .map_err(|e| CacheError::Encoding(e.to_string()))?;
                    return Ok(Some(identity));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Entry exists but is past its TTL
        self.entries.write().await.remove(email);
        Ok(None)
    }

    async fn set(
        &self,
        email: &str,
        identity: &Identity,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(&IdentitySnapshot::from(identity))
            .map_err(|e| CacheError::Encoding(e.to_string()))?;

        self.entries.write().await.insert(
            email.to_string(),
            Entry {
                json,
                expires_at: Instant::now() + ttl,
            },
        );

        Ok(())
    }

    async fn invalidate(&self, email: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(email);
        Ok(())
    }
}
