//! Cloud storage account key strategy.
//!
//! Storage accounts expose two long-lived keys, `key1` and `key2`. The
//! strategy always regenerates the slot the stored secret does NOT point
//! at, then stores the fresh key; which slot is "hot" therefore inverts on
//! every rotation, and consumers of the stored secret are never handed a
//! key that is about to be regenerated. Initialization, with nothing
//! stored yet, always starts with `key1`.

use crate::cloud::{CloudClient, STORAGE_KEY_1, STORAGE_KEY_2};
use crate::config::ResourceConfiguration;
use crate::context::{OperationContext, RotationFlags};
use crate::credential::{StorageAccountKeyCredential, CONTENT_TYPE_JSON};
use crate::rotation::{eligibility, expires_at, write_rotated_secret, RotationResult, Rotator};
use crate::store::SecretStore;
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use std::sync::Arc;

/// Rotator for storage account access keys.
pub struct StorageAccountKeyRotator {
    cloud: Arc<dyn CloudClient>,
}

impl StorageAccountKeyRotator {
    /// Strategy tag.
    pub const STRATEGY_TYPE: &'static str = "azure/storage/account/key";

    /// Creates the rotator on a control-plane client.
    pub fn new(cloud: Arc<dyn CloudClient>) -> Self {
        Self { cloud }
    }

    /// Picks the slot to regenerate during a rotation: the opposite of the
    /// one currently stored. `None` means the stored payload cannot be
    /// trusted and the rotation must not guess.
    fn opposite_of_stored(payload: &str) -> Option<&'static str> {
        let stored: StorageAccountKeyCredential = serde_json::from_str(payload).ok()?;
        match stored.name.as_str() {
            STORAGE_KEY_1 => Some(STORAGE_KEY_2),
            STORAGE_KEY_2 => Some(STORAGE_KEY_1),
            _ => None,
        }
    }

    async fn perform(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
        key_name: &str,
    ) -> Result<RotationResult> {
        let Some(resource_id) = resource.target_resource_id.as_deref() else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                "no target resource id configured",
            ));
        };

        let cancel = ctx.cancellation();
        let keys = self.cloud.storage_account_keys(resource_id, cancel).await?;
        let has = |name: &str| keys.iter().any(|key| key.name == name);
        if !(has(STORAGE_KEY_1) && has(STORAGE_KEY_2)) {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!("storage account '{resource_id}' did not report both keys"),
            ));
        }

        if flags.what_if {
            return Ok(RotationResult::rotated(
                &resource.name,
                format!("Would have regenerated '{key_name}' of '{resource_id}'"),
            ));
        }
        if cancel.is_cancelled() {
            return Err(RotavaultError::Cancelled);
        }

        let Some(fresh) = self
            .cloud
            .regenerate_storage_account_key(resource_id, key_name, cancel)
            .await?
        else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!("regenerating '{key_name}' of '{resource_id}' failed"),
            ));
        };
        if fresh.name != key_name {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!(
                    "control plane returned '{}' when '{key_name}' was requested",
                    fresh.name
                ),
            ));
        }

        tracing::debug!(secret = %resource.name, key = key_name, "storage key regenerated");

        let credential = StorageAccountKeyCredential {
            name: fresh.name,
            value: fresh.value,
        };
        let payload = serde_json::to_string(&credential)?;
        let expires_on = expires_at(ctx.clock().now(), resource.expiration_days);

        let store = ctx.store_for(resource)?;
        Ok(write_rotated_secret(
            store.as_ref(),
            &resource.name,
            &payload,
            expires_on,
            CONTENT_TYPE_JSON,
            format!("regenerated '{key_name}' of '{resource_id}'"),
            &format!("'{key_name}' was regenerated on '{resource_id}'"),
        )
        .await)
    }
}

#[async_trait]
impl Rotator for StorageAccountKeyRotator {
    fn strategy_type(&self) -> &'static str {
        Self::STRATEGY_TYPE
    }

    /// Initialization has no stored slot to invert, so it always starts
    /// the cycle at `key1`.
    async fn initialize(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
    ) -> Result<RotationResult> {
        let store = ctx.store_for(resource)?;
        if let Some(verdict) =
            eligibility::check_initialization(resource, store.as_ref(), flags).await?
        {
            return Ok(verdict);
        }
        self.perform(resource, ctx, flags, STORAGE_KEY_1).await
    }

    async fn rotate(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
    ) -> Result<RotationResult> {
        let store = ctx.store_for(resource)?;
        if let Some(verdict) =
            eligibility::check_rotation(resource, store.as_ref(), flags, ctx.clock().now()).await?
        {
            return Ok(verdict);
        }

        // Eligibility proved the secret exists; a vanished value between the
        // two reads is reported rather than guessed around.
        let Some(payload) = store.get_secret_value(&resource.name).await? else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                "stored key reference disappeared between reads",
            ));
        };
        let Some(key_name) = Self::opposite_of_stored(&payload) else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                "stored key reference is not a valid key1/key2 credential",
            ));
        };

        self.perform(resource, ctx, flags, key_name).await
    }
}
