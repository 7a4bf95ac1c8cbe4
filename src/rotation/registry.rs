//! Strategy registry.

use crate::cloud::CloudClient;
use crate::database::DatabaseClient;
use crate::rotation::{
    DatabaseAdministratorRotator, DatabaseUserRotator, ManualSecretRotator, Rotator,
    StorageAccountKeyRotator,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Map from strategy tag to rotator instance.
///
/// Constructed once by the driver and shared read-only for the run. A
/// lookup miss is handled by the driver entry points as a per-resource
/// skip, never a fatal error.
#[derive(Default)]
pub struct RotatorRegistry {
    rotators: HashMap<&'static str, Arc<dyn Rotator>>,
}

impl RotatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with all four built-in strategies wired to the
    /// given collaborators.
    pub fn with_defaults(cloud: Arc<dyn CloudClient>, database: Arc<dyn DatabaseClient>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ManualSecretRotator::new()));
        registry.register(Arc::new(DatabaseAdministratorRotator::new(cloud.clone())));
        registry.register(Arc::new(DatabaseUserRotator::new(database)));
        registry.register(Arc::new(StorageAccountKeyRotator::new(cloud)));
        registry
    }

    /// Registers a rotator under its strategy tag, replacing any previous
    /// registration of the same tag.
    pub fn register(&mut self, rotator: Arc<dyn Rotator>) {
        self.rotators.insert(rotator.strategy_type(), rotator);
    }

    /// Resolves the rotator for a strategy tag.
    pub fn resolve(&self, strategy_type: &str) -> Option<Arc<dyn Rotator>> {
        self.rotators.get(strategy_type).cloned()
    }

    /// The registered strategy tags.
    pub fn strategy_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rotators.keys().copied()
    }
}
