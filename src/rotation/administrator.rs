//! Cloud database administrator strategy.
//!
//! Regenerates the administrator password of a managed PostgreSQL flexible
//! server: read the server's hostname and administrator login from the
//! control plane, patch a freshly generated password onto the server, then
//! persist the `{hostname, username, password}` credential. The patch
//! happens-before the store write; a store failure after a successful patch
//! is the re-initialization verdict.
//!
//! No overlap is possible here - the server has exactly one administrator
//! password, and the old one dies the moment the patch lands.

use crate::cloud::CloudClient;
use crate::config::ResourceConfiguration;
use crate::context::{OperationContext, RotationFlags};
use crate::credential::{DatabaseCredential, CONTENT_TYPE_JSON};
use crate::generator::generate_password;
use crate::rotation::{eligibility, expires_at, write_rotated_secret, RotationResult, Rotator};
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use std::sync::Arc;

const PASSWORD_LENGTH: usize = 16;

/// Rotator for managed database administrator passwords.
pub struct DatabaseAdministratorRotator {
    cloud: Arc<dyn CloudClient>,
}

impl DatabaseAdministratorRotator {
    /// Strategy tag.
    pub const STRATEGY_TYPE: &'static str = "azure/postgresql/flexible-server/administrator";

    /// Creates the rotator on a control-plane client.
    pub fn new(cloud: Arc<dyn CloudClient>) -> Self {
        Self { cloud }
    }

    async fn perform(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
    ) -> Result<RotationResult> {
        let Some(resource_id) = resource.target_resource_id.as_deref() else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                "no target resource id configured",
            ));
        };

        let cancel = ctx.cancellation();
        let Some(server) = self.cloud.database_server_details(resource_id, cancel).await? else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!("database server '{resource_id}' could not be read"),
            ));
        };

        let password = generate_password(PASSWORD_LENGTH);

        if flags.what_if {
            return Ok(RotationResult::rotated(
                &resource.name,
                format!(
                    "Would have rotated the administrator password of '{}'",
                    server.hostname
                ),
            ));
        }
        if cancel.is_cancelled() {
            return Err(RotavaultError::Cancelled);
        }

        if !self
            .cloud
            .update_database_administrator_password(resource_id, &password, cancel)
            .await?
        {
            // No partial state: the server still holds the old password and
            // the store still holds the old credential.
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!("administrator password update on '{resource_id}' failed"),
            ));
        }

        tracing::debug!(secret = %resource.name, server = %server.hostname, "administrator password patched");

        // Store the login the control plane reported, never an assumed one.
        let credential = DatabaseCredential {
            hostname: server.hostname.clone(),
            username: server.administrator_login,
            password,
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
            format!("rotated the administrator password of '{}'", server.hostname),
            "the administrator password was changed on the server",
        )
        .await)
    }
}

#[async_trait]
impl Rotator for DatabaseAdministratorRotator {
    fn strategy_type(&self) -> &'static str {
        Self::STRATEGY_TYPE
    }

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
        self.perform(resource, ctx, flags).await
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
        self.perform(resource, ctx, flags).await
    }
}
