//! Recording database double for tests.

use crate::database::{DatabaseClient, DatabaseConnection, DatabaseTarget};
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// [`DatabaseClient`] that records connection targets and executed DDL.
///
/// Connections share the recorder, so statements stay visible after the
/// connection is dropped.
#[derive(Default)]
pub struct MockDatabaseClient {
    connects: Arc<Mutex<Vec<DatabaseTarget>>>,
    statements: Arc<Mutex<Vec<String>>>,
    fail_connect: AtomicBool,
    fail_execute: Arc<AtomicBool>,
}

impl MockDatabaseClient {
    /// Creates a client that accepts every connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `connect` fail.
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Makes `execute` fail on every open and future connection.
    pub fn fail_execute(&self, fail: bool) {
        self.fail_execute.store(fail, Ordering::SeqCst);
    }

    /// Targets of every connection opened so far.
    pub fn connection_targets(&self) -> Vec<DatabaseTarget> {
        self.connects.lock().unwrap().clone()
    }

    /// Every statement executed so far, in order.
    pub fn executed_statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn connect(
        &self,
        target: &DatabaseTarget,
        _cancel: &CancellationToken,
    ) -> Result<Box<dyn DatabaseConnection>> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(RotavaultError::Database(format!(
                "connection to '{}' refused",
                target.hostname
            )));
        }

        self.connects.lock().unwrap().push(target.clone());
        Ok(Box::new(MockDatabaseConnection {
            statements: Arc::clone(&self.statements),
            fail_execute: Arc::clone(&self.fail_execute),
        }))
    }
}

struct MockDatabaseConnection {
    statements: Arc<Mutex<Vec<String>>>,
    fail_execute: Arc<AtomicBool>,
}

#[async_trait]
impl DatabaseConnection for MockDatabaseConnection {
    async fn execute(&mut self, statement: &str, _cancel: &CancellationToken) -> Result<()> {
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(RotavaultError::Database("statement rejected".to_string()));
        }
        self.statements.lock().unwrap().push(statement.to_string());
        Ok(())
    }
}
