//! Credential store implementations
//!
//! The `CredentialStore` port persists which provider + credentials each
//! agent has bound. Two implementations live here:
//!
//! - `InMemoryCredentialStore` for development and tests
//! - `CachedCredentialStore`, which JSON-serializes settings into any
//!   `CacheBackend` with a sliding TTL - the production shape, where the
//!   backend is a distributed cache
//!
//! Both enforce the single-binding invariant: saving a connection
//! overwrites whatever provider the agent was bound to before.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{AgentId, DomainPort, PortError};
use domain_crm::{AgentCrmSettings, CredentialStore, Credentials};

/// Cache entry key prefix for agent CRM settings
const KEY_PREFIX: &str = "crm-settings:";

/// Sliding expiry applied to cached settings
const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// In-memory credential store for development and testing.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    settings: RwLock<HashMap<AgentId, AgentCrmSettings>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryCredentialStore {}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_connection(
        &self,
        agent_id: AgentId,
    ) -> Result<Option<AgentCrmSettings>, PortError> {
        Ok(self.settings.read().await.get(&agent_id).cloned())
    }

    async fn save_connection(
        &self,
        agent_id: AgentId,
        crm_id: &str,
        credentials: Credentials,
    ) -> Result<(), PortError> {
        let settings = AgentCrmSettings::new(agent_id, crm_id, credentials);
        self.settings.write().await.insert(agent_id, settings);
        Ok(())
    }

    async fn delete_connection(&self, agent_id: AgentId) -> Result<(), PortError> {
        self.settings.write().await.remove(&agent_id);
        Ok(())
    }
}

/// Minimal byte-oriented cache seam for the cached credential store.
///
/// Stands in for whatever distributed cache production runs; the TTL is
/// per-entry and a `set` refreshes it (sliding expiry).
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Gets the entry, or `None` when missing or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError>;

    /// Writes the entry with a fresh TTL
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), PortError>;

    /// Removes the entry; removing a missing entry is a no-op
    async fn remove(&self, key: &str) -> Result<(), PortError>;
}

/// Credential store persisting JSON-serialized settings into a cache
/// backend under `"crm-settings:{agent_id}"`.
///
/// Reads refresh the TTL, giving a sliding expiry: a binding stays alive
/// as long as the agent keeps using it.
pub struct CachedCredentialStore<B: CacheBackend> {
    cache: B,
    ttl: Duration,
}

impl<B: CacheBackend> CachedCredentialStore<B> {
    /// Creates a store with the default 30-day sliding TTL
    pub fn new(cache: B) -> Self {
        Self {
            cache,
            ttl: DEFAULT_TTL,
        }
    }

    /// Overrides the sliding TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key(agent_id: AgentId) -> String {
        format!("{KEY_PREFIX}{}", agent_id.as_uuid())
    }
}

impl<B: CacheBackend> DomainPort for CachedCredentialStore<B> {}

#[async_trait]
impl<B: CacheBackend> CredentialStore for CachedCredentialStore<B> {
    async fn get_connection(
        &self,
        agent_id: AgentId,
    ) -> Result<Option<AgentCrmSettings>, PortError> {
        let key = Self::key(agent_id);
        let Some(bytes) = self.cache.get(&key).await? else {
            return Ok(None);
        };

        let settings: AgentCrmSettings = serde_json::from_slice(&bytes)
            .map_err(|err| PortError::serialization(err.to_string()))?;

        // Sliding expiry: touch the entry on read
        self.cache.set(&key, bytes, self.ttl).await?;

        Ok(Some(settings))
    }

    async fn save_connection(
        &self,
        agent_id: AgentId,
        crm_id: &str,
        credentials: Credentials,
    ) -> Result<(), PortError> {
        let settings = AgentCrmSettings::new(agent_id, crm_id, credentials);
        let bytes = serde_json::to_vec(&settings)
            .map_err(|err| PortError::serialization(err.to_string()))?;

        self.cache.set(&Self::key(agent_id), bytes, self.ttl).await
    }

    async fn delete_connection(&self, agent_id: AgentId) -> Result<(), PortError> {
        self.cache.remove(&Self::key(agent_id)).await
    }
}

/// In-process `CacheBackend` with real expiry, for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl InMemoryCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError> {
        let expired = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.entries.write().await.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), PortError> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PortError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(agent_id: AgentId) -> Credentials {
        Credentials::with_api_key(agent_id, "key-1")
    }

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let store = InMemoryCredentialStore::new();
        let agent_id = AgentId::new();

        store
            .save_connection(agent_id, "rex", credentials(agent_id))
            .await
            .unwrap();

        let settings = store.get_connection(agent_id).await.unwrap().unwrap();
        assert_eq!(settings.crm_id, "rex");
        assert_eq!(settings.credentials.api_key.as_deref(), Some("key-1"));
    }

    #[tokio::test]
    async fn test_in_memory_save_overwrites() {
        let store = InMemoryCredentialStore::new();
        let agent_id = AgentId::new();

        store
            .save_connection(agent_id, "rex", credentials(agent_id))
            .await
            .unwrap();
        store
            .save_connection(agent_id, "vaultre", credentials(agent_id))
            .await
            .unwrap();

        let settings = store.get_connection(agent_id).await.unwrap().unwrap();
        assert_eq!(settings.crm_id, "vaultre");
    }

    #[tokio::test]
    async fn test_in_memory_delete_is_idempotent() {
        let store = InMemoryCredentialStore::new();
        let agent_id = AgentId::new();

        store.delete_connection(agent_id).await.unwrap();

        store
            .save_connection(agent_id, "rex", credentials(agent_id))
            .await
            .unwrap();
        store.delete_connection(agent_id).await.unwrap();
        store.delete_connection(agent_id).await.unwrap();

        assert!(store.get_connection(agent_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_agent_is_not_connected() {
        let store = InMemoryCredentialStore::new();
        assert!(store.get_connection(AgentId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cached_store_roundtrip() {
        let store = CachedCredentialStore::new(InMemoryCache::new());
        let agent_id = AgentId::new();

        store
            .save_connection(agent_id, "agentbox", credentials(agent_id))
            .await
            .unwrap();

        let settings = store.get_connection(agent_id).await.unwrap().unwrap();
        assert_eq!(settings.crm_id, "agentbox");
        assert_eq!(settings.agent_id, agent_id);
    }

    #[tokio::test]
    async fn test_cached_store_expires_entries() {
        let store =
            CachedCredentialStore::new(InMemoryCache::new()).with_ttl(Duration::from_millis(30));
        let agent_id = AgentId::new();

        store
            .save_connection(agent_id, "rex", credentials(agent_id))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get_connection(agent_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cached_store_read_refreshes_ttl() {
        let store =
            CachedCredentialStore::new(InMemoryCache::new()).with_ttl(Duration::from_millis(200));
        let agent_id = AgentId::new();

        store
            .save_connection(agent_id, "rex", credentials(agent_id))
            .await
            .unwrap();

        // Keep reading inside the window; each read slides the expiry
        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(80)).await;
            assert!(store.get_connection(agent_id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_cache_key_shape() {
        let agent_id = AgentId::new();
        let key = CachedCredentialStore::<InMemoryCache>::key(agent_id);
        assert!(key.starts_with("crm-settings:"));
        assert!(key.contains(&agent_id.as_uuid().to_string()));
    }
}
