//! PostgreSQL database client.

use crate::database::{DatabaseClient, DatabaseConnection, DatabaseTarget};
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, Executor, PgConnection};
use tokio_util::sync::CancellationToken;

/// [`DatabaseClient`] backed by sqlx with TLS required.
///
/// Managed PostgreSQL offerings enforce TLS on the public endpoint, so the
/// connection is configured with `PgSslMode::Require` and the default port.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgDatabaseClient;

impl PgDatabaseClient {
    /// Creates a client.
    pub fn new() -> Self {
        Self
    }
}

fn connect_options(target: &DatabaseTarget) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&target.hostname)
        .username(&target.username)
        .password(&target.password)
        .ssl_mode(PgSslMode::Require)
}

#[async_trait]
impl DatabaseClient for PgDatabaseClient {
    async fn connect(
        &self,
        target: &DatabaseTarget,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn DatabaseConnection>> {
        if cancel.is_cancelled() {
            return Err(RotavaultError::Cancelled);
        }

        let options = connect_options(target);
        let connection = tokio::select! {
            _ = cancel.cancelled() => return Err(RotavaultError::Cancelled),
            connection = PgConnection::connect_with(&options) => connection
                .map_err(|e| RotavaultError::Database(format!(
                    "connection to '{}' failed: {e}",
                    target.hostname
                )))?,
        };

        Ok(Box::new(PgDatabaseConnection { connection }))
    }
}

struct PgDatabaseConnection {
    connection: PgConnection,
}

#[async_trait]
impl DatabaseConnection for PgDatabaseConnection {
    async fn execute(&mut self, statement: &str, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(RotavaultError::Cancelled);
        }

        self.connection
            .execute(statement)
            .await
            .map_err(|e| RotavaultError::Database(format!("statement failed: {e}")))?;
        Ok(())
    }
}
