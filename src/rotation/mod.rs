//! The rotation engine.
//!
//! A [`Rotator`] is one credential-kind strategy: it knows how to mint a
//! replacement credential against the backing resource and persist it in
//! the secret store. The shared control flow - eligibility, the what-if
//! switch, verdict assembly - lives in free functions here and in
//! [`eligibility`], not in a base type; a strategy is just the capability
//! set `{strategy_type, initialize, rotate}` plus a [`registry`] entry.
//!
//! Within one invocation the ordering guarantees are fixed: the
//! eligibility read happens first, the what-if early-return happens before
//! any external mutation, and the external mutation happens before the
//! secret-store write. A failure to write the store after the external
//! mutation succeeded is the one verdict that demands operator action; its
//! note always says re-initialization is required.

pub mod administrator;
pub mod eligibility;
pub mod manual;
pub mod registry;
pub mod storage_key;
pub mod user;

use crate::config::ResourceConfiguration;
use crate::context::{OperationContext, RotationFlags};
use crate::store::SecretStore;
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use administrator::DatabaseAdministratorRotator;
pub use manual::ManualSecretRotator;
pub use registry::RotatorRegistry;
pub use storage_key::StorageAccountKeyRotator;
pub use user::DatabaseUserRotator;

/// Verdict of one initialize/rotate invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationResult {
    /// Name of the secret the verdict is about.
    pub name: String,
    /// Whether the rotation completed (or, in what-if mode, would have).
    pub rotated: bool,
    /// Human-readable explanation of the verdict.
    pub notes: String,
}

impl RotationResult {
    /// A success verdict: a real end-to-end rotation or a what-if run.
    pub fn rotated(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotated: true,
            notes: notes.into(),
        }
    }

    /// A skip or failure verdict.
    pub fn not_rotated(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotated: false,
            notes: notes.into(),
        }
    }
}

/// One rotation strategy.
///
/// Implementations are shared read-only across concurrent invocations; the
/// driver must not concurrently rotate the same `(store, name)` pair.
#[async_trait]
pub trait Rotator: Send + Sync {
    /// The tag resources use to select this strategy.
    fn strategy_type(&self) -> &'static str;

    /// First-time provisioning of a secret that does not exist yet.
    ///
    /// Skips with an `already initialized` note when the secret exists and
    /// `force` is off.
    async fn initialize(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
    ) -> Result<RotationResult>;

    /// Regeneration of an existing secret.
    ///
    /// Skips when the secret is absent (`not found`) or not yet inside its
    /// expiration overlap window (`not due`), unless `force` is on.
    async fn rotate(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
    ) -> Result<RotationResult>;
}

/// Initializes one configured resource, resolving its strategy by tag.
///
/// An unregistered strategy tag is a per-resource skip, not a fatal error.
/// A run whose token is already cancelled aborts before dispatch, with
/// every store and backing resource untouched.
pub async fn initialize_resource(
    ctx: &OperationContext,
    resource: &ResourceConfiguration,
    flags: &RotationFlags,
) -> Result<RotationResult> {
    if ctx.cancellation().is_cancelled() {
        return Err(RotavaultError::Cancelled);
    }
    match ctx.rotators().resolve(&resource.strategy_type) {
        Some(rotator) => rotator.initialize(resource, ctx, flags).await,
        None => Ok(unknown_strategy(resource)),
    }
}

/// Rotates one configured resource, resolving its strategy by tag.
pub async fn rotate_resource(
    ctx: &OperationContext,
    resource: &ResourceConfiguration,
    flags: &RotationFlags,
) -> Result<RotationResult> {
    if ctx.cancellation().is_cancelled() {
        return Err(RotavaultError::Cancelled);
    }
    match ctx.rotators().resolve(&resource.strategy_type) {
        Some(rotator) => rotator.rotate(resource, ctx, flags).await,
        None => Ok(unknown_strategy(resource)),
    }
}

fn unknown_strategy(resource: &ResourceConfiguration) -> RotationResult {
    tracing::debug!(
        resource = %resource.name,
        strategy = %resource.strategy_type,
        "no rotation strategy registered"
    );
    RotationResult::not_rotated(
        &resource.name,
        format!(
            "no rotation strategy registered for '{}'",
            resource.strategy_type
        ),
    )
}

/// Computes `now + days`, with days in 24-hour units and fractional days
/// resolved to milliseconds.
pub(crate) fn expires_at(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    now + chrono::Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

/// Persists the freshly minted value after the external mutation succeeded.
///
/// This write is best-effort by contract: cancellation is not consulted, and
/// both a refused write and a transport error collapse into the
/// re-initialization verdict instead of propagating - losing the credential
/// that is already live on the backing resource is the worse outcome.
pub(crate) async fn write_rotated_secret(
    store: &dyn SecretStore,
    name: &str,
    value: &str,
    expires_on: DateTime<Utc>,
    content_type: &str,
    success_notes: String,
    mutation_description: &str,
) -> RotationResult {
    let failure = |detail: Option<String>| {
        let suffix = detail.map(|d| format!(" ({d})")).unwrap_or_default();
        RotationResult::not_rotated(
            name,
            format!(
                "{mutation_description}, but the secret store update failed{suffix}; \
                 re-initialization is required to recover"
            ),
        )
    };

    match store
        .update_secret(name, value, Some(expires_on), content_type)
        .await
    {
        Ok(Some(_)) => {
            tracing::debug!(secret = name, "rotated secret persisted");
            RotationResult::rotated(name, success_notes)
        }
        Ok(None) => {
            tracing::warn!(
                secret = name,
                "store write failed after external mutation; re-initialization required"
            );
            failure(None)
        }
        Err(e) => {
            tracing::warn!(
                secret = name,
                error = %e,
                "store write failed after external mutation; re-initialization required"
            );
            failure(Some(e.to_string()))
        }
    }
}
