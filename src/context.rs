//! Per-run ambient state.
//!
//! An [`OperationContext`] carries the immutable per-run configuration: the
//! store map, the strategy registry, the credential map, the clock, and the
//! cancellation token. The per-invocation switches (`force`, `what_if`, the
//! operator-supplied value for the manual strategy) live in the small
//! [`RotationFlags`] struct passed by value, so parallel dispatch never
//! mutates shared state.

use crate::clock::{Clock, SystemClock};
use crate::config::ResourceConfiguration;
use crate::rotation::registry::RotatorRegistry;
use crate::rotation::Rotator;
use crate::store::SecretStore;
use crate::{Result, RotavaultError};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Opaque handle to a provider credential resolved at bootstrap.
///
/// The core never inspects the payload; adapters that were constructed from
/// one of these can downcast it back to the concrete type they stored.
#[derive(Clone)]
pub struct CloudCredential {
    inner: Arc<dyn Any + Send + Sync>,
}

impl CloudCredential {
    /// Wraps a concrete credential value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Borrows the payload as `T`, if that is what was stored.
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl std::fmt::Debug for CloudCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudCredential").finish_non_exhaustive()
    }
}

/// Per-invocation switches, passed by value.
#[derive(Debug, Clone, Default)]
pub struct RotationFlags {
    /// Bypass the expiration/presence checks.
    pub force: bool,
    /// Simulate: report success but perform no mutations.
    pub what_if: bool,
    /// Operator-supplied new value, consumed by the manual strategy.
    pub secret_value: Option<String>,
}

impl RotationFlags {
    /// Flags with everything off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the force switch.
    pub fn with_force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Enables what-if simulation.
    pub fn with_what_if(mut self) -> Self {
        self.what_if = true;
        self
    }

    /// Sets the operator-supplied secret value.
    pub fn with_secret_value(mut self, value: impl Into<String>) -> Self {
        self.secret_value = Some(value.into());
        self
    }
}

/// Immutable per-run state shared by every rotation in a driver run.
///
/// Built once by the driver via [`OperationContext::builder`], then shared
/// read-only across concurrent invocations.
pub struct OperationContext {
    stores: HashMap<String, Arc<dyn SecretStore>>,
    rotators: RotatorRegistry,
    credentials: HashMap<String, CloudCredential>,
    clock: Arc<dyn Clock>,
    cancellation: CancellationToken,
}

impl OperationContext {
    /// Starts building a context.
    pub fn builder() -> OperationContextBuilder {
        OperationContextBuilder::default()
    }

    /// Resolves the store a resource is configured against.
    ///
    /// A missing store is a bootstrap defect, not an operational condition,
    /// so this is an error rather than a skip verdict.
    pub fn store_for(&self, resource: &ResourceConfiguration) -> Result<&Arc<dyn SecretStore>> {
        self.stores
            .get(&resource.store_name)
            .ok_or_else(|| RotavaultError::UnknownStore(resource.store_name.clone()))
    }

    /// Looks up a store by name.
    pub fn store(&self, name: &str) -> Option<&Arc<dyn SecretStore>> {
        self.stores.get(name)
    }

    /// The strategy registry for this run.
    pub fn rotators(&self) -> &RotatorRegistry {
        &self.rotators
    }

    /// Looks up a bootstrap credential by name.
    pub fn credential(&self, name: &str) -> Option<&CloudCredential> {
        self.credentials.get(name)
    }

    /// The time source for expiration arithmetic.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The run's cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Builder for [`OperationContext`].
#[derive(Default)]
pub struct OperationContextBuilder {
    stores: HashMap<String, Arc<dyn SecretStore>>,
    rotators: RotatorRegistry,
    credentials: HashMap<String, CloudCredential>,
    clock: Option<Arc<dyn Clock>>,
    cancellation: Option<CancellationToken>,
}

impl OperationContextBuilder {
    /// Adds a secret store under `name` (the `store_name` resources refer to).
    pub fn store(mut self, name: impl Into<String>, store: Arc<dyn SecretStore>) -> Self {
        self.stores.insert(name.into(), store);
        self
    }

    /// Sets the strategy registry.
    pub fn rotators(mut self, rotators: RotatorRegistry) -> Self {
        self.rotators = rotators;
        self
    }

    /// Registers one rotator in the registry.
    pub fn rotator(mut self, rotator: Arc<dyn Rotator>) -> Self {
        self.rotators.register(rotator);
        self
    }

    /// Adds a bootstrap credential under `name`.
    pub fn credential(mut self, name: impl Into<String>, credential: CloudCredential) -> Self {
        self.credentials.insert(name.into(), credential);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the cancellation token. Defaults to a fresh, never-cancelled token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Finishes the context.
    pub fn build(self) -> OperationContext {
        OperationContext {
            stores: self.stores,
            rotators: self.rotators,
            credentials: self.credentials,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            cancellation: self.cancellation.unwrap_or_default(),
        }
    }
}
