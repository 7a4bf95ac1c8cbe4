//! Azure Key Vault secret store adapter.

use crate::store::{SecretInfo, SecretStore};
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use azure_identity::DefaultAzureCredential;
use azure_security_keyvault::SecretClient;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Secret store backed by an Azure Key Vault.
///
/// Authentication goes through `DefaultAzureCredential`, so the usual
/// environment/managed-identity/CLI chain applies. Each `update_secret`
/// creates a new secret version carrying the expiration and content type
/// as vault attributes.
pub struct KeyVaultSecretStore {
    client: SecretClient,
    store_id: String,
}

impl KeyVaultSecretStore {
    /// Connects to the vault at `vault_url`, e.g.
    /// `https://myvault.vault.azure.net`.
    pub fn new(store_id: impl Into<String>, vault_url: &str) -> Result<Self> {
        let credential = Arc::new(DefaultAzureCredential::create(Default::default()).map_err(
            |e| RotavaultError::Store(format!("failed to create Azure credentials: {e}")),
        )?);

        let client = SecretClient::new(vault_url, credential)
            .map_err(|e| RotavaultError::Store(format!("failed to create secret client: {e}")))?;

        Ok(Self {
            client,
            store_id: store_id.into(),
        })
    }

    fn is_not_found(err: &impl std::fmt::Display) -> bool {
        let text = err.to_string();
        text.contains("SecretNotFound") || text.contains("404")
    }
}

fn to_chrono(timestamp: time::OffsetDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_default()
}

fn to_offset(timestamp: DateTime<Utc>) -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(timestamp.timestamp())
        .unwrap_or(time::OffsetDateTime::UNIX_EPOCH)
}

/// Extracts the version segment from a vault secret id
/// (`https://{vault}/secrets/{name}/{version}`).
fn version_from_id(id: &str) -> Option<String> {
    id.rsplit('/').next().map(str::to_string)
}

#[async_trait]
impl SecretStore for KeyVaultSecretStore {
    fn id(&self) -> &str {
        &self.store_id
    }

    async fn get_secret(&self, name: &str) -> Result<Option<SecretInfo>> {
        match self.client.get(name).into_future().await {
            Ok(secret) => Ok(Some(SecretInfo {
                version: version_from_id(&secret.id),
                id: secret.id,
                name: name.to_string(),
                content_type: None,
                enabled: secret.attributes.enabled,
                created_on: to_chrono(secret.attributes.created_on),
                expires_on: secret.attributes.expires_on.map(to_chrono),
                updated_on: to_chrono(secret.attributes.updated_on),
                store_id: self.store_id.clone(),
            })),
            Err(e) if Self::is_not_found(&e) => Ok(None),
            Err(e) => Err(RotavaultError::Store(format!("get '{name}': {e}"))),
        }
    }

    async fn get_secret_value(&self, name: &str) -> Result<Option<String>> {
        match self.client.get(name).into_future().await {
            Ok(secret) => Ok(Some(secret.value)),
            Err(e) if Self::is_not_found(&e) => Ok(None),
            Err(e) => Err(RotavaultError::Store(format!("get '{name}': {e}"))),
        }
    }

    async fn update_secret(
        &self,
        name: &str,
        value: &str,
        expires_on: Option<DateTime<Utc>>,
        content_type: &str,
    ) -> Result<Option<SecretInfo>> {
        let mut set = self
            .client
            .set(name, value)
            .content_type(content_type.to_string());
        if let Some(expires_on) = expires_on {
            set = set.expiration(to_offset(expires_on));
        }

        if let Err(e) = set.into_future().await {
            tracing::warn!(secret = name, error = %e, "key vault write failed");
            return Ok(None);
        }

        self.get_secret(name).await
    }
}
