//! Session store abstraction over an external key-value store with per-key
//! TTL. Holds the single currently-valid refresh token per user.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("session store unavailable: {0}")]
pub struct StoreError(#[from] redis::RedisError);

/// Key-value session storage.
///
/// All cross-request coordination relies on the backing store's atomicity of
/// single-key set/get/delete; no in-process locking is layered on top.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `value` under `key`, unconditionally overwriting any prior value
    /// and resetting the TTL.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Redis-backed store used in production.
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect and build the multiplexed connection manager.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the initial connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory store with the same overwrite and TTL semantics, for tests.

    use super::{SessionStore, StoreError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemorySessionStore {
        entries: Mutex<HashMap<String, (String, Instant)>>,
    }

    impl MemorySessionStore {
        pub(crate) fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl SessionStore for MemorySessionStore {
        async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
            self.entries
                .lock()
                .await
                .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
            Ok(())
        }

        async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
            let mut entries = self.entries.lock().await;
            match entries.get(key) {
                Some((value, deadline)) if *deadline > Instant::now() => Ok(Some(value.clone())),
                Some(_) => {
                    entries.remove(key);
                    Ok(None)
                }
                None => Ok(None),
            }
        }

        async fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.entries.lock().await.remove(key);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn put_overwrites_previous_value() {
            let store = MemorySessionStore::new();
            store
                .put("refresh:u1", "first", Duration::from_secs(60))
                .await
                .expect("put");
            store
                .put("refresh:u1", "second", Duration::from_secs(60))
                .await
                .expect("put");

            let value = store.fetch("refresh:u1").await.expect("fetch");
            assert_eq!(value.as_deref(), Some("second"));
        }

        #[tokio::test]
        async fn entries_expire() {
            let store = MemorySessionStore::new();
            store
                .put("refresh:u1", "value", Duration::from_millis(40))
                .await
                .expect("put");

            tokio::time::sleep(Duration::from_millis(80)).await;
            assert_eq!(store.fetch("refresh:u1").await.expect("fetch"), None);
        }

        #[tokio::test]
        async fn remove_is_idempotent() {
            let store = MemorySessionStore::new();
            store.remove("refresh:missing").await.expect("remove");
            store.remove("refresh:missing").await.expect("remove again");
        }
    }
}
