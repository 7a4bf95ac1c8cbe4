//! Persisted secret payload formats.
//!
//! Database strategies store a [`DatabaseCredential`] and the storage-key
//! strategy stores a [`StorageAccountKeyCredential`], both serialized as
//! compact JSON with lowercase field names and written with the
//! `application/json` content type. The manual strategy stores the raw
//! operator-supplied string under the resource's configured content type.

use serde::{Deserialize, Serialize};

/// Content type for JSON credential payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type for raw string secrets.
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Connection credential persisted for database secrets.
///
/// The same shape is used for administrator logins and generated
/// per-application users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseCredential {
    /// DNS name of the database endpoint.
    pub hostname: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

/// Storage account key persisted for storage secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccountKeyCredential {
    /// Slot name, exactly `key1` or `key2`.
    pub name: String,
    /// Key material.
    pub value: String,
}
