//! Rotavault - lifecycle automation for long-lived credentials.
//!
//! Rotavault persists credentials in a pluggable secret store, tracks their
//! expiration, and periodically regenerates them against the backing
//! resources: database administrator passwords, per-application database
//! users, storage account access keys, and operator-supplied secrets.
//!
//! # Features
//!
//! - **Strategy per credential kind**: four built-in rotators behind one
//!   [`Rotator`] capability set, resolved through a [`RotatorRegistry`]
//! - **Two-generation overlap**: database users and storage keys rotate
//!   without a window where the previous credential is already dead
//! - **What-if and force**: simulate any rotation, or bypass the
//!   expiration check, per run
//! - **Deterministic time**: all expiration arithmetic goes through an
//!   injected [`Clock`]
//! - **Async/Await**: built on tokio for non-blocking I/O, with
//!   cancellation through `tokio_util::sync::CancellationToken`
//!
//! # Quick Start
//!
//! ```no_run
//! use rotavault::cloud::mock::MockCloudClient;
//! use rotavault::database::mock::MockDatabaseClient;
//! use rotavault::rotation::{self, RotatorRegistry};
//! use rotavault::store::memory::InMemorySecretStore;
//! use rotavault::{OperationContext, ResourceConfiguration, RotationFlags};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rotavault::Result<()> {
//!     let cloud = Arc::new(MockCloudClient::new());
//!     let database = Arc::new(MockDatabaseClient::new());
//!
//!     let ctx = OperationContext::builder()
//!         .store("main", Arc::new(InMemorySecretStore::new("main")))
//!         .rotators(RotatorRegistry::with_defaults(cloud, database))
//!         .build();
//!
//!     let resource = ResourceConfiguration::new("api-key", "manual/generic", "main");
//!     let flags = RotationFlags::new().with_secret_value("sk-secret123");
//!
//!     let verdict = rotation::initialize_resource(&ctx, &resource, &flags).await?;
//!     println!("{}: rotated={} ({})", verdict.name, verdict.rotated, verdict.notes);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Strategies
//!
//! | Strategy tag | Backing resource | Overlap |
//! |--------------|------------------|---------|
//! | `manual/generic` | none (operator-supplied value) | none |
//! | `azure/postgresql/flexible-server/administrator` | managed PostgreSQL server | none |
//! | `database/postgresql/user` | PostgreSQL user with `VALID UNTIL` | two generations |
//! | `azure/storage/account/key` | storage account `key1`/`key2` pair | two generations |
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `mock` | yes | in-memory cloud/database doubles for tests and local drivers |
//! | `azure` | no | Azure Key Vault secret store adapter |
//! | `postgres` | no | sqlx-backed PostgreSQL client |
//!
//! The scheduling loop, retry policy, and CLI live in the driver, not
//! here: this crate turns one `(resource, flags)` pair into one
//! [`RotationResult`] verdict.

pub mod clock;
pub mod cloud;
pub mod config;
pub mod context;
pub mod credential;
pub mod database;
pub mod error;
pub mod generator;
pub mod rotation;
pub mod store;
pub mod validation;

pub use clock::{Clock, SystemClock};
pub use config::{DatabaseUserConfig, ResourceConfiguration};
pub use context::{CloudCredential, OperationContext, RotationFlags};
pub use error::{Result, RotavaultError};
pub use rotation::{RotationResult, Rotator, RotatorRegistry};
pub use store::{SecretInfo, SecretStore};
