//! Cloud control-plane abstraction.
//!
//! The rotation engine reads database server metadata, patches database
//! administrator passwords, and drives the two-slot storage account key
//! rotation through a [`CloudClient`]. Implementations map onto a
//! provider's resource-manager API; transient control-plane failures are
//! reported as `None`/`false`, which the engine treats as non-retryable at
//! this layer (the driver retries at a higher altitude).

#[cfg(feature = "mock")]
pub mod mock;

use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Name of the first storage account key slot.
pub const STORAGE_KEY_1: &str = "key1";

/// Name of the second storage account key slot.
pub const STORAGE_KEY_2: &str = "key2";

/// Metadata read from a managed database server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseServerInfo {
    /// DNS name of the server endpoint.
    pub hostname: String,
    /// Login name of the server administrator.
    pub administrator_login: String,
}

/// One of the two named keys of a storage account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccountKey {
    /// Slot name, `key1` or `key2`.
    pub name: String,
    /// Key material.
    pub value: String,
}

/// A provider control-plane client.
///
/// All implementations must be `Send + Sync`; a client is shared read-only
/// across concurrent rotations. Every operation may block on network I/O
/// and observes the supplied cancellation token.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Reads hostname and administrator login for a database server.
    ///
    /// Returns `Ok(None)` when the resource does not exist or the caller is
    /// not authorized to read it.
    async fn database_server_details(
        &self,
        resource_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<DatabaseServerInfo>>;

    /// Replaces the administrator password of a database server, waiting
    /// for the operation to complete.
    ///
    /// Idempotent: replaying with the same password must be safe. Returns
    /// `Ok(false)` when the control plane rejects or fails the patch.
    async fn update_database_administrator_password(
        &self,
        resource_id: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<bool>;

    /// Lists a storage account's keys.
    ///
    /// A healthy account returns exactly [`STORAGE_KEY_1`] and
    /// [`STORAGE_KEY_2`], in that order. An incomplete or empty list means
    /// the account is missing a slot or could not be read.
    async fn storage_account_keys(
        &self,
        resource_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<StorageAccountKey>>;

    /// Triggers server-side regeneration of one key slot and returns the
    /// fresh key, or `Ok(None)` on failure.
    async fn regenerate_storage_account_key(
        &self,
        resource_id: &str,
        key_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<StorageAccountKey>>;
}
