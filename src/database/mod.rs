//! Database client abstraction.
//!
//! The database-user strategy needs exactly one capability: open a
//! TLS-authenticated connection as the server administrator and execute a
//! single DDL statement. [`DatabaseClient`] produces connections;
//! [`DatabaseConnection`] executes statements.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "postgres")]
pub mod postgres;

use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Connection parameters for one database endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    /// DNS name of the database endpoint.
    pub hostname: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

/// Opens authenticated database connections.
///
/// Implementations must be `Send + Sync`; clients are shared read-only
/// across concurrent rotations.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Opens a connection to `target`, authenticating over TLS.
    ///
    /// A connection failure (unreachable host, bad credentials) is an
    /// error; the strategy converts it into a verdict.
    async fn connect(
        &self,
        target: &DatabaseTarget,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn DatabaseConnection>>;
}

/// An open database connection.
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Executes one DDL statement.
    async fn execute(&mut self, statement: &str, cancel: &CancellationToken) -> Result<()>;
}
