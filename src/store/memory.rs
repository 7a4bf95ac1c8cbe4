//! In-memory secret store.
//!
//! The reference adapter used by tests and local drivers. Entries live in a
//! concurrent map with per-key last-writer-wins semantics; timestamps come
//! from the injected [`Clock`] so expiration tests are deterministic.

use crate::clock::{Clock, SystemClock};
use crate::store::{SecretInfo, SecretStore};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredSecret {
    value: String,
    info: SecretInfo,
}

/// In-memory [`SecretStore`] with write-failure injection.
///
/// # Example
///
/// ```
/// use rotavault::store::memory::InMemorySecretStore;
/// use rotavault::store::SecretStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> rotavault::Result<()> {
/// let store = InMemorySecretStore::new("m");
/// store.update_secret("api-key", "s3cret", None, "text/plain").await?;
///
/// let info = store.get_secret("api-key").await?.unwrap();
/// assert_eq!(info.name, "api-key");
/// assert_eq!(store.get_secret_value("api-key").await?.as_deref(), Some("s3cret"));
/// # Ok(())
/// # }
/// ```
pub struct InMemorySecretStore {
    store_id: String,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, StoredSecret>>,
    fail_updates: AtomicBool,
}

impl InMemorySecretStore {
    /// Creates an empty store stamped with `store_id`, on the system clock.
    pub fn new(store_id: impl Into<String>) -> Self {
        Self::with_clock(store_id, Arc::new(SystemClock))
    }

    /// Creates an empty store with an injected clock.
    pub fn with_clock(store_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store_id: store_id.into(),
            clock,
            entries: RwLock::new(HashMap::new()),
            fail_updates: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent `update_secret` report a write failure
    /// (`Ok(None)`) without touching stored state. Reads keep working.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Seeds a secret with explicit timestamps, bypassing the clock.
    ///
    /// Test fixture helper; rotation code always goes through
    /// [`update_secret`](SecretStore::update_secret).
    pub async fn seed(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        expires_on: Option<DateTime<Utc>>,
        content_type: &str,
    ) {
        let name = name.into();
        let now = self.clock.now();
        let info = SecretInfo {
            id: format!("{}/{}", self.store_id, name),
            name: name.clone(),
            content_type: Some(content_type.to_string()),
            enabled: true,
            created_on: now,
            expires_on,
            updated_on: now,
            store_id: self.store_id.clone(),
            version: Some(uuid::Uuid::new_v4().to_string()),
        };
        let mut entries = self.entries.write().await;
        entries.insert(
            name,
            StoredSecret {
                value: value.into(),
                info,
            },
        );
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    fn id(&self) -> &str {
        &self.store_id
    }

    async fn get_secret(&self, name: &str) -> Result<Option<SecretInfo>> {
        let entries = self.entries.read().await;
        Ok(entries.get(name).map(|entry| entry.info.clone()))
    }

    async fn get_secret_value(&self, name: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(name).map(|entry| entry.value.clone()))
    }

    async fn update_secret(
        &self,
        name: &str,
        value: &str,
        expires_on: Option<DateTime<Utc>>,
        content_type: &str,
    ) -> Result<Option<SecretInfo>> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let created_on = entries
            .get(name)
            .map(|existing| existing.info.created_on)
            .unwrap_or(now);

        let info = SecretInfo {
            id: format!("{}/{}", self.store_id, name),
            name: name.to_string(),
            content_type: Some(content_type.to_string()),
            enabled: true,
            created_on,
            expires_on,
            updated_on: now,
            store_id: self.store_id.clone(),
            version: Some(uuid::Uuid::new_v4().to_string()),
        };
        entries.insert(
            name.to_string(),
            StoredSecret {
                value: value.to_string(),
                info: info.clone(),
            },
        );
        Ok(Some(info))
    }
}
