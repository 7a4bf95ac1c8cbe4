//! Database user strategy.
//!
//! Instead of changing an existing login's password, each rotation creates
//! a brand-new user with a server-side `VALID UNTIL` expiration and stores
//! its credential. The previous user keeps working until the database
//! expires it, which gives callers a two-generation overlap window without
//! any coordination: readers of the secret pick up the new user on their
//! next fetch, and stragglers on the old one are retired by the server.
//!
//! The administrator credential used to run the DDL is itself a managed
//! secret (see [`administrator`](crate::rotation::administrator)), read
//! from the same store under
//! [`DatabaseUserConfig::server_secret_name`](crate::config::DatabaseUserConfig).

use crate::config::{DatabaseUserConfig, ResourceConfiguration};
use crate::context::{OperationContext, RotationFlags};
use crate::credential::{DatabaseCredential, CONTENT_TYPE_JSON};
use crate::database::{DatabaseClient, DatabaseConnection, DatabaseTarget};
use crate::generator::{generate_password, generate_username};
use crate::rotation::{eligibility, expires_at, write_rotated_secret, RotationResult, Rotator};
use crate::store::SecretStore;
use crate::validation::is_valid_database_identifier;
use crate::{Result, RotavaultError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;

const USERNAME_LENGTH: usize = 16;
const PASSWORD_LENGTH: usize = 24;

/// Rotator for per-application database users.
pub struct DatabaseUserRotator {
    database: Arc<dyn DatabaseClient>,
}

impl DatabaseUserRotator {
    /// Strategy tag.
    pub const STRATEGY_TYPE: &'static str = "database/postgresql/user";

    /// Creates the rotator on a database client.
    pub fn new(database: Arc<dyn DatabaseClient>) -> Self {
        Self { database }
    }

    async fn perform(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
    ) -> Result<RotationResult> {
        let Some(user) = resource.database_user.as_ref() else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                "no database user settings configured",
            ));
        };

        // Everything interpolated into the DDL as an identifier is
        // validated up front; nothing after this point is allowed to
        // contain quoting surprises.
        for role in &user.roles {
            if !is_valid_database_identifier(role) {
                return Ok(RotationResult::not_rotated(
                    &resource.name,
                    format!("Invalid role identifier '{role}'"),
                ));
            }
        }
        if !user.name_prefix.is_empty() && !is_valid_database_identifier(&user.name_prefix) {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!("Invalid username prefix '{}'", user.name_prefix),
            ));
        }

        let store = ctx.store_for(resource)?;
        let Some(admin_payload) = store.get_secret_value(&user.server_secret_name).await? else {
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!(
                    "administrator secret '{}' not found in the store",
                    user.server_secret_name
                ),
            ));
        };
        let admin: DatabaseCredential = match serde_json::from_str(&admin_payload) {
            Ok(admin) => admin,
            Err(_) => {
                return Ok(RotationResult::not_rotated(
                    &resource.name,
                    format!(
                        "administrator secret '{}' is not a valid JSON credential",
                        user.server_secret_name
                    ),
                ));
            }
        };

        let cancel = ctx.cancellation();
        let target = DatabaseTarget {
            hostname: user.hostname.clone(),
            username: admin.username,
            password: admin.password,
        };
        let mut connection = match self.database.connect(&target, cancel).await {
            Ok(connection) => connection,
            Err(e) => {
                return Ok(RotationResult::not_rotated(
                    &resource.name,
                    format!("could not connect to '{}': {e}", user.hostname),
                ));
            }
        };

        if flags.what_if {
            return Ok(RotationResult::rotated(
                &resource.name,
                format!("Would have created a new database user on '{}'", user.hostname),
            ));
        }
        if cancel.is_cancelled() {
            return Err(RotavaultError::Cancelled);
        }

        let username = generate_username(&user.name_prefix, USERNAME_LENGTH);
        let password = generate_password(PASSWORD_LENGTH);
        let expires_on = expires_at(ctx.clock().now(), resource.expiration_days);
        let statement = create_user_statement(&username, &password, user, expires_on);

        if let Err(e) = connection.execute(&statement, cancel).await {
            // The user was not created; old state is intact on both sides.
            return Ok(RotationResult::not_rotated(
                &resource.name,
                format!("creating user '{username}' on '{}' failed: {e}", user.hostname),
            ));
        }

        tracing::debug!(secret = %resource.name, host = %user.hostname, user = %username, "database user created");

        let credential = DatabaseCredential {
            hostname: user.hostname.clone(),
            username: username.clone(),
            password,
        };
        let payload = serde_json::to_string(&credential)?;

        Ok(write_rotated_secret(
            store.as_ref(),
            &resource.name,
            &payload,
            expires_on,
            CONTENT_TYPE_JSON,
            format!("created database user '{username}' on '{}'", user.hostname),
            &format!("database user '{username}' was created on '{}'", user.hostname),
        )
        .await)
    }
}

/// Builds the single DDL statement of a rotation.
///
/// The username and roles are interpolated as double-quoted identifiers
/// (validated earlier), the password as a single-quoted literal (the
/// generator's alphabet contains no quote characters), and the expiration
/// as an RFC 3339 UTC timestamp. The `IN ROLE` clause is omitted entirely
/// when no roles are configured.
fn create_user_statement(
    username: &str,
    password: &str,
    user: &DatabaseUserConfig,
    expires_on: DateTime<Utc>,
) -> String {
    let roles = if user.roles.is_empty() {
        String::new()
    } else {
        let quoted: Vec<String> = user.roles.iter().map(|role| format!("\"{role}\"")).collect();
        format!(" IN ROLE {}", quoted.join(", "))
    };

    format!(
        "CREATE USER \"{username}\" PASSWORD '{password}'{roles} VALID UNTIL '{}'",
        expires_on.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

#[async_trait]
impl Rotator for DatabaseUserRotator {
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

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::mock::MockDatabaseClient;
    use crate::store::memory::InMemorySecretStore;
    use crate::store::SecretStore;
    use chrono::TimeZone;

    struct Fixture {
        store: Arc<InMemorySecretStore>,
        database: Arc<MockDatabaseClient>,
        ctx: OperationContext,
    }

    async fn fixture() -> Fixture {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(InMemorySecretStore::with_clock("m", clock.clone()));
        store
            .seed(
                "orders-admin",
                r#"{"hostname":"orders.postgres.example.com","username":"padmin","password":"admin-pw"}"#,
                None,
                CONTENT_TYPE_JSON,
            )
            .await;

        let database = Arc::new(MockDatabaseClient::new());
        let ctx = OperationContext::builder()
            .store("m", store.clone())
            .clock(clock)
            .build();
        Fixture { store, database, ctx }
    }

    fn resource() -> ResourceConfiguration {
        ResourceConfiguration::new("orders-user", DatabaseUserRotator::STRATEGY_TYPE, "m")
            .with_database_user(
                DatabaseUserConfig::new("orders-admin", "orders.postgres.example.com")
                    .with_roles(["app_read", "app_write"]),
            )
    }

    #[tokio::test]
    async fn test_initialize_creates_user_and_stores_credential() {
        let f = fixture().await;
        let rotator = DatabaseUserRotator::new(f.database.clone());

        let result = rotator
            .initialize(&resource(), &f.ctx, &RotationFlags::new())
            .await
            .unwrap();
        assert!(result.rotated, "{}", result.notes);

        // Connected as the administrator from the stored credential.
        let targets = f.database.connection_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].username, "padmin");
        assert_eq!(targets[0].password, "admin-pw");
        assert_eq!(targets[0].hostname, "orders.postgres.example.com");

        // One DDL statement carrying username, password, roles, expiry.
        let statements = f.database.executed_statements();
        assert_eq!(statements.len(), 1);
        let ddl = &statements[0];

        let payload = f.store.get_secret_value("orders-user").await.unwrap().unwrap();
        let credential: DatabaseCredential = serde_json::from_str(&payload).unwrap();
        assert_eq!(credential.username.len(), 16);
        assert!(credential.username.starts_with('u'));
        assert_eq!(credential.password.len(), 24);

        assert!(ddl.contains(&format!("CREATE USER \"{}\"", credential.username)));
        assert!(ddl.contains(&format!("PASSWORD '{}'", credential.password)));
        assert!(ddl.contains("IN ROLE \"app_read\", \"app_write\""));
        assert!(ddl.contains("VALID UNTIL '2025-08-30T00:00:00Z'"));

        let info = f.store.get_secret("orders-user").await.unwrap().unwrap();
        assert_eq!(
            info.expires_on,
            Some(Utc.with_ymd_and_hms(2025, 8, 30, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_invalid_role_skips_before_any_io() {
        let f = fixture().await;
        let rotator = DatabaseUserRotator::new(f.database.clone());
        let resource = ResourceConfiguration::new("orders-user", DatabaseUserRotator::STRATEGY_TYPE, "m")
            .with_database_user(
                DatabaseUserConfig::new("orders-admin", "orders.postgres.example.com")
                    .with_roles(["good", "bad name"]),
            );

        let result = rotator
            .initialize(&resource, &f.ctx, &RotationFlags::new())
            .await
            .unwrap();

        assert!(!result.rotated);
        assert!(result.notes.contains("Invalid role"));
        assert!(f.database.connection_targets().is_empty());
        assert!(f.store.get_secret("orders-user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_database_user_settings() {
        let f = fixture().await;
        let rotator = DatabaseUserRotator::new(f.database.clone());
        let resource =
            ResourceConfiguration::new("orders-user", DatabaseUserRotator::STRATEGY_TYPE, "m");

        let result = rotator
            .initialize(&resource, &f.ctx, &RotationFlags::new())
            .await
            .unwrap();
        assert!(!result.rotated);
        assert!(result.notes.contains("database user settings"));
    }

    #[tokio::test]
    async fn test_missing_administrator_secret() {
        let f = fixture().await;
        let rotator = DatabaseUserRotator::new(f.database.clone());
        let resource = ResourceConfiguration::new("orders-user", DatabaseUserRotator::STRATEGY_TYPE, "m")
            .with_database_user(DatabaseUserConfig::new("absent-admin", "orders.postgres.example.com"));

        let result = rotator
            .initialize(&resource, &f.ctx, &RotationFlags::new())
            .await
            .unwrap();
        assert!(!result.rotated);
        assert!(result.notes.contains("not found"));
    }

    #[tokio::test]
    async fn test_malformed_administrator_secret() {
        let f = fixture().await;
        f.store.seed("broken-admin", "not json", None, "text/plain").await;
        let rotator = DatabaseUserRotator::new(f.database.clone());
        let resource = ResourceConfiguration::new("orders-user", DatabaseUserRotator::STRATEGY_TYPE, "m")
            .with_database_user(DatabaseUserConfig::new("broken-admin", "orders.postgres.example.com"));

        let result = rotator
            .initialize(&resource, &f.ctx, &RotationFlags::new())
            .await
            .unwrap();
        assert!(!result.rotated);
        assert!(result.notes.contains("not a valid JSON credential"));
    }

    #[tokio::test]
    async fn test_connect_failure_is_a_verdict() {
        let f = fixture().await;
        f.database.fail_connect(true);
        let rotator = DatabaseUserRotator::new(f.database.clone());

        let result = rotator
            .initialize(&resource(), &f.ctx, &RotationFlags::new())
            .await
            .unwrap();
        assert!(!result.rotated);
        assert!(result.notes.contains("could not connect"));
    }

    #[tokio::test]
    async fn test_what_if_connects_but_mutates_nothing() {
        let f = fixture().await;
        let rotator = DatabaseUserRotator::new(f.database.clone());

        let result = rotator
            .initialize(&resource(), &f.ctx, &RotationFlags::new().with_what_if())
            .await
            .unwrap();

        assert!(result.rotated);
        assert!(result.notes.contains("Would have"));
        // Connectivity was proven, but no DDL ran and nothing was stored.
        assert_eq!(f.database.connection_targets().len(), 1);
        assert!(f.database.executed_statements().is_empty());
        assert!(f.store.get_secret("orders-user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ddl_failure_leaves_store_untouched() {
        let f = fixture().await;
        f.database.fail_execute(true);
        let rotator = DatabaseUserRotator::new(f.database.clone());

        let result = rotator
            .initialize(&resource(), &f.ctx, &RotationFlags::new())
            .await
            .unwrap();
        assert!(!result.rotated);
        assert!(result.notes.contains("failed"));
        assert!(f.store.get_secret("orders-user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_after_create_reports_reinitialization() {
        let f = fixture().await;
        let rotator = DatabaseUserRotator::new(f.database.clone());

        // Wedge the store after the fixture seeding.
        f.store.fail_updates(true);
        let result = rotator
            .initialize(&resource(), &f.ctx, &RotationFlags::new())
            .await
            .unwrap();

        assert!(!result.rotated);
        assert!(result.notes.contains("re-initialization"));
        // The user does exist on the server.
        assert_eq!(f.database.executed_statements().len(), 1);
    }

    #[test]
    fn test_statement_omits_role_clause_when_no_roles() {
        let user = DatabaseUserConfig::new("a", "h");
        let expires = Utc.with_ymd_and_hms(2025, 8, 30, 0, 0, 0).unwrap();
        let ddl = create_user_statement("u1", "pw", &user, expires);
        assert_eq!(
            ddl,
            "CREATE USER \"u1\" PASSWORD 'pw' VALID UNTIL '2025-08-30T00:00:00Z'"
        );
        assert!(!ddl.contains("IN ROLE"));
    }

    #[test]
    fn test_statement_quotes_each_role() {
        let user = DatabaseUserConfig::new("a", "h").with_roles(["r1", "r2"]);
        let expires = Utc.with_ymd_and_hms(2025, 8, 30, 0, 0, 0).unwrap();
        let ddl = create_user_statement("u1", "pw", &user, expires);
        assert!(ddl.contains("IN ROLE \"r1\", \"r2\""));
    }
}
