//! Redis cache helper with JSON serialization.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::StoreResult;

/// Namespaced JSON cache over Redis.
///
/// Values are serialized with `serde_json`. A missing key is `Ok(None)`,
/// never an error.
#[derive(Clone)]
pub struct CacheClient {
    manager: ConnectionManager,
    namespace: String,
}

/// Build the namespaced Redis key.
fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}

impl CacheClient {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str, namespace: impl Into<String>) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self {
            manager,
            namespace: namespace.into(),
        })
    }

    /// Get a cached value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let mut conn = self.manager.clone();
        let payload: Option<String> = conn.get(namespaced_key(&self.namespace, key)).await?;
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store a value with a TTL.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let payload = serde_json::to_string(value)?;
        let _: () = conn
            .set_ex(
                namespaced_key(&self.namespace, key),
                payload,
                ttl.as_secs().max(1),
            )
            .await?;
        Ok(())
    }

    /// Remove a cached value.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(namespaced_key(&self.namespace, key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_key() {
        assert_eq!(
            namespaced_key("copydesk", "scan:latest"),
            "copydesk:scan:latest"
        );
    }
}
