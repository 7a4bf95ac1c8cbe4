//! Scriptable control-plane double for tests.

use crate::cloud::{CloudClient, DatabaseServerInfo, StorageAccountKey};
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// In-memory [`CloudClient`] with failure injection.
///
/// Pre-populate servers and storage accounts, then assert against the
/// recorded mutations. Two failure modes are injectable: contract-level
/// failures (`Ok(false)`/`Ok(None)`, the way a real control plane reports
/// a rejected operation) and transport-level errors
/// ([`RotavaultError::Cloud`], the way an adapter reports a severed
/// network path).
///
/// ```
/// use rotavault::cloud::mock::MockCloudClient;
/// use rotavault::cloud::CloudClient;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> rotavault::Result<()> {
/// let cloud = MockCloudClient::new();
/// cloud.add_database_server("rid", "db.example.com", "padmin").await;
///
/// let cancel = CancellationToken::new();
/// cloud.update_database_administrator_password("rid", "new-pw", &cancel).await?;
/// assert_eq!(cloud.administrator_password("rid").await.as_deref(), Some("new-pw"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockCloudClient {
    servers: RwLock<HashMap<String, DatabaseServerInfo>>,
    admin_passwords: RwLock<HashMap<String, String>>,
    storage_keys: RwLock<HashMap<String, Vec<StorageAccountKey>>>,
    scripted_keys: RwLock<HashMap<(String, String), String>>,
    regeneration_counter: AtomicU64,
    fail_password_updates: AtomicBool,
    fail_regeneration: AtomicBool,
    transport_error: RwLock<Option<String>>,
}

impl MockCloudClient {
    /// Creates an empty control plane.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a database server resource.
    pub async fn add_database_server(
        &self,
        resource_id: impl Into<String>,
        hostname: impl Into<String>,
        administrator_login: impl Into<String>,
    ) {
        let mut servers = self.servers.write().await;
        servers.insert(
            resource_id.into(),
            DatabaseServerInfo {
                hostname: hostname.into(),
                administrator_login: administrator_login.into(),
            },
        );
    }

    /// Registers a storage account with the given keys.
    pub async fn add_storage_account(
        &self,
        resource_id: impl Into<String>,
        keys: Vec<StorageAccountKey>,
    ) {
        let mut accounts = self.storage_keys.write().await;
        accounts.insert(resource_id.into(), keys);
    }

    /// Scripts the value the next regeneration of `(resource_id, key_name)`
    /// returns. Unscripted regenerations synthesize a fresh value.
    pub async fn script_regenerated_value(
        &self,
        resource_id: impl Into<String>,
        key_name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let mut scripted = self.scripted_keys.write().await;
        scripted.insert((resource_id.into(), key_name.into()), value.into());
    }

    /// Makes password patches report failure (`Ok(false)`).
    pub fn fail_password_updates(&self, fail: bool) {
        self.fail_password_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes key regenerations report failure (`Ok(None)`).
    pub fn fail_regeneration(&self, fail: bool) {
        self.fail_regeneration.store(fail, Ordering::SeqCst);
    }

    /// Makes every operation fail with [`RotavaultError::Cloud`], as if
    /// the control plane were unreachable.
    pub async fn inject_error(&self, message: impl Into<String>) {
        *self.transport_error.write().await = Some(message.into());
    }

    /// Clears an injected transport error.
    pub async fn clear_error(&self) {
        *self.transport_error.write().await = None;
    }

    async fn check_transport(&self) -> Result<()> {
        let error = self.transport_error.read().await;
        match error.as_ref() {
            Some(message) => Err(RotavaultError::Cloud(message.clone())),
            None => Ok(()),
        }
    }

    /// Returns the administrator password last patched onto a server.
    pub async fn administrator_password(&self, resource_id: &str) -> Option<String> {
        let passwords = self.admin_passwords.read().await;
        passwords.get(resource_id).cloned()
    }

    /// Returns the current keys of a storage account.
    pub async fn current_keys(&self, resource_id: &str) -> Vec<StorageAccountKey> {
        let accounts = self.storage_keys.read().await;
        accounts.get(resource_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CloudClient for MockCloudClient {
    async fn database_server_details(
        &self,
        resource_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<DatabaseServerInfo>> {
        self.check_transport().await?;
        let servers = self.servers.read().await;
        Ok(servers.get(resource_id).cloned())
    }

    async fn update_database_administrator_password(
        &self,
        resource_id: &str,
        password: &str,
        _cancel: &CancellationToken,
    ) -> Result<bool> {
        self.check_transport().await?;
        if self.fail_password_updates.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let servers = self.servers.read().await;
        if !servers.contains_key(resource_id) {
            return Ok(false);
        }
        drop(servers);

        let mut passwords = self.admin_passwords.write().await;
        passwords.insert(resource_id.to_string(), password.to_string());
        Ok(true)
    }

    async fn storage_account_keys(
        &self,
        resource_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<StorageAccountKey>> {
        self.check_transport().await?;
        let accounts = self.storage_keys.read().await;
        Ok(accounts.get(resource_id).cloned().unwrap_or_default())
    }

    async fn regenerate_storage_account_key(
        &self,
        resource_id: &str,
        key_name: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<StorageAccountKey>> {
        self.check_transport().await?;
        if self.fail_regeneration.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let value = {
            let mut scripted = self.scripted_keys.write().await;
            match scripted.remove(&(resource_id.to_string(), key_name.to_string())) {
                Some(value) => value,
                None => {
                    let n = self.regeneration_counter.fetch_add(1, Ordering::SeqCst);
                    format!("{key_name}-regenerated-{n}")
                }
            }
        };

        let mut accounts = self.storage_keys.write().await;
        let Some(keys) = accounts.get_mut(resource_id) else {
            return Ok(None);
        };
        let Some(key) = keys.iter_mut().find(|key| key.name == key_name) else {
            return Ok(None);
        };
        key.value = value;
        Ok(Some(key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{STORAGE_KEY_1, STORAGE_KEY_2};

    fn two_keys() -> Vec<StorageAccountKey> {
        vec![
            StorageAccountKey {
                name: STORAGE_KEY_1.to_string(),
                value: "A".to_string(),
            },
            StorageAccountKey {
                name: STORAGE_KEY_2.to_string(),
                value: "B".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_unknown_server_is_none() {
        let cloud = MockCloudClient::new();
        let cancel = CancellationToken::new();
        let details = cloud.database_server_details("rid", &cancel).await.unwrap();
        assert!(details.is_none());
    }

    #[tokio::test]
    async fn test_password_patch_recorded() {
        let cloud = MockCloudClient::new();
        cloud.add_database_server("rid", "db.example.com", "padmin").await;
        let cancel = CancellationToken::new();

        let updated = cloud
            .update_database_administrator_password("rid", "pw-1", &cancel)
            .await
            .unwrap();
        assert!(updated);
        assert_eq!(cloud.administrator_password("rid").await.as_deref(), Some("pw-1"));
    }

    #[tokio::test]
    async fn test_password_patch_failure_injection() {
        let cloud = MockCloudClient::new();
        cloud.add_database_server("rid", "db.example.com", "padmin").await;
        cloud.fail_password_updates(true);
        let cancel = CancellationToken::new();

        let updated = cloud
            .update_database_administrator_password("rid", "pw-1", &cancel)
            .await
            .unwrap();
        assert!(!updated);
        assert!(cloud.administrator_password("rid").await.is_none());
    }

    #[tokio::test]
    async fn test_scripted_regeneration() {
        let cloud = MockCloudClient::new();
        cloud.add_storage_account("acct", two_keys()).await;
        cloud.script_regenerated_value("acct", STORAGE_KEY_2, "B2").await;
        let cancel = CancellationToken::new();

        let key = cloud
            .regenerate_storage_account_key("acct", STORAGE_KEY_2, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(key.name, STORAGE_KEY_2);
        assert_eq!(key.value, "B2");

        // The account now serves the regenerated value.
        let keys = cloud.current_keys("acct").await;
        assert_eq!(keys[1].value, "B2");
        assert_eq!(keys[0].value, "A");
    }

    #[tokio::test]
    async fn test_unscripted_regeneration_synthesizes_fresh_values() {
        let cloud = MockCloudClient::new();
        cloud.add_storage_account("acct", two_keys()).await;
        let cancel = CancellationToken::new();

        let first = cloud
            .regenerate_storage_account_key("acct", STORAGE_KEY_1, &cancel)
            .await
            .unwrap()
            .unwrap();
        let second = cloud
            .regenerate_storage_account_key("acct", STORAGE_KEY_1, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first.value, second.value);
    }

    #[tokio::test]
    async fn test_injected_transport_error_surfaces_as_cloud_error() {
        let cloud = MockCloudClient::new();
        cloud.add_database_server("rid", "db.example.com", "padmin").await;
        cloud.inject_error("control plane unreachable").await;
        let cancel = CancellationToken::new();

        let result = cloud.database_server_details("rid", &cancel).await;
        assert!(matches!(result, Err(RotavaultError::Cloud(_))));
        let result = cloud.storage_account_keys("rid", &cancel).await;
        assert!(matches!(result, Err(RotavaultError::Cloud(_))));

        cloud.clear_error().await;
        let details = cloud.database_server_details("rid", &cancel).await.unwrap();
        assert!(details.is_some());
    }

    #[tokio::test]
    async fn test_regenerating_unknown_key_is_none() {
        let cloud = MockCloudClient::new();
        cloud.add_storage_account("acct", two_keys()).await;
        let cancel = CancellationToken::new();

        let key = cloud
            .regenerate_storage_account_key("acct", "key3", &cancel)
            .await
            .unwrap();
        assert!(key.is_none());
    }
}
