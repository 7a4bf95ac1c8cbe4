//! Declarative configuration for managed credentials.
//!
//! A [`ResourceConfiguration`] describes one secret the engine is
//! responsible for: where it lives, which strategy regenerates it, and the
//! expiration policy applied to each new value. Configurations are usually
//! deserialized from a config file by the driver and are immutable for the
//! lifetime of a process.

use serde::Deserialize;

fn default_expiration_days() -> f64 {
    90.0
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

fn default_name_prefix() -> String {
    "u".to_string()
}

/// Declarative description of one managed credential.
///
/// Use the builder methods for ergonomic assembly in code:
///
/// ```
/// use rotavault::config::ResourceConfiguration;
///
/// let resource = ResourceConfiguration::new("orders-db-admin", "azure/postgresql/flexible-server/administrator", "prod-vault")
///     .with_expiration_days(30.0)
///     .with_expiration_overlap_days(7.0)
///     .with_target_resource_id("/subscriptions/s1/resourceGroups/rg/providers/x/orders");
/// assert_eq!(resource.expiration_days, 30.0);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfiguration {
    /// Identifier of the secret within its store. Unique per store.
    pub name: String,

    /// Strategy tag selecting the rotator (e.g. `manual/generic`).
    pub strategy_type: String,

    /// Identifier of the target secret store in the context's store map.
    pub store_name: String,

    /// Lifetime, in 24-hour days, applied to each newly written secret.
    #[serde(default = "default_expiration_days")]
    pub expiration_days: f64,

    /// How many days before true expiration the secret becomes eligible
    /// for early rotation.
    #[serde(default)]
    pub expiration_overlap_days: f64,

    /// MIME label stored alongside the value.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Opaque identifier of the backing cloud resource, where the strategy
    /// needs one.
    #[serde(default)]
    pub target_resource_id: Option<String>,

    /// Database-user strategy settings.
    #[serde(default)]
    pub database_user: Option<DatabaseUserConfig>,
}

impl ResourceConfiguration {
    /// Creates a configuration with the default expiration policy
    /// (90 days, no overlap, `text/plain`).
    pub fn new(
        name: impl Into<String>,
        strategy_type: impl Into<String>,
        store_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            strategy_type: strategy_type.into(),
            store_name: store_name.into(),
            expiration_days: default_expiration_days(),
            expiration_overlap_days: 0.0,
            content_type: default_content_type(),
            target_resource_id: None,
            database_user: None,
        }
    }

    /// Sets the lifetime applied to newly written secrets.
    pub fn with_expiration_days(mut self, days: f64) -> Self {
        self.expiration_days = days;
        self
    }

    /// Sets the early-rotation window.
    pub fn with_expiration_overlap_days(mut self, days: f64) -> Self {
        self.expiration_overlap_days = days;
        self
    }

    /// Sets the MIME label stored alongside the value.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the backing cloud resource identifier.
    pub fn with_target_resource_id(mut self, id: impl Into<String>) -> Self {
        self.target_resource_id = Some(id.into());
        self
    }

    /// Sets the database-user strategy settings.
    pub fn with_database_user(mut self, user: DatabaseUserConfig) -> Self {
        self.database_user = Some(user);
        self
    }
}

/// Settings for the database-user strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseUserConfig {
    /// Prefix of generated usernames.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Roles granted to each generated user, in grant order.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Name of the secret, in the same store, holding the administrator
    /// credential as JSON.
    pub server_secret_name: String,

    /// DNS name of the database endpoint.
    pub hostname: String,
}

impl DatabaseUserConfig {
    /// Creates settings with the default `u` username prefix and no roles.
    pub fn new(server_secret_name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name_prefix: default_name_prefix(),
            roles: Vec::new(),
            server_secret_name: server_secret_name.into(),
            hostname: hostname.into(),
        }
    }

    /// Sets the username prefix.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Sets the granted roles.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}
