//! Secret store abstraction.
//!
//! A [`SecretStore`] is a durable, confidential key-value repository with
//! per-entry metadata including expiration. The engine only ever needs
//! three operations: read metadata, read the raw value, and create-or-
//! overwrite with a new expiration.
//!
//! Adapters:
//!
//! - [`memory::InMemorySecretStore`] - concurrent-map reference adapter for
//!   tests and local drivers (always compiled).
//! - `keyvault::KeyVaultSecretStore` - Azure Key Vault adapter (`azure`
//!   feature).

pub mod memory;

#[cfg(feature = "azure")]
pub mod keyvault;

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Metadata describing one stored secret. The value is never carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretInfo {
    /// Store-specific identifier of this secret.
    pub id: String,
    /// Name of the secret within its store.
    pub name: String,
    /// MIME label recorded at the last write.
    pub content_type: Option<String>,
    /// Whether the secret is usable.
    pub enabled: bool,
    /// When the secret was first created.
    pub created_on: DateTime<Utc>,
    /// When the current value expires, if an expiration was set.
    pub expires_on: Option<DateTime<Utc>>,
    /// When the current value was written.
    pub updated_on: DateTime<Utc>,
    /// Identifier of the owning store.
    pub store_id: String,
    /// Store-specific version of the current value.
    pub version: Option<String>,
}

/// A persistent secret repository.
///
/// All implementations must be `Send + Sync`; stores are shared read-only
/// across concurrent rotations. A `get_secret` that happens-after a
/// successful `update_secret` on the same key, in the same process, must
/// observe the new `updated_on`, `expires_on`, and `version`.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the store identifier recorded in [`SecretInfo::store_id`].
    fn id(&self) -> &str;

    /// Fetches metadata for a secret.
    ///
    /// Returns `Ok(None)` when the secret does not exist; absence is data
    /// the eligibility policy consumes, never an error.
    async fn get_secret(&self, name: &str) -> Result<Option<SecretInfo>>;

    /// Fetches the raw value of a secret, or `Ok(None)` when absent.
    async fn get_secret_value(&self, name: &str) -> Result<Option<String>>;

    /// Creates or overwrites a secret.
    ///
    /// On success returns the newly written metadata, including the updated
    /// `updated_on`, `expires_on`, and `version`. `Ok(None)` signals a write
    /// failure the rotator must surface in its verdict.
    async fn update_secret(
        &self,
        name: &str,
        value: &str,
        expires_on: Option<DateTime<Utc>>,
        content_type: &str,
    ) -> Result<Option<SecretInfo>>;
}
