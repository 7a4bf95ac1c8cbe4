//! Error types for rotation operations.

use thiserror::Error;

/// Result type alias using [`RotavaultError`].
pub type Result<T> = std::result::Result<T, RotavaultError>;

/// Errors that can occur while driving a rotation.
///
/// Expected operational conditions (a secret that is not due, a missing
/// control-plane resource, a malformed stored payload) are never reported
/// through this type; they come back as [`RotationResult`](crate::RotationResult)
/// verdicts. An `Err` means the run itself is broken: a store name that was
/// never wired into the context, a cancelled token, or an I/O layer that
/// failed in a way no verdict can describe.
#[derive(Debug, Error)]
pub enum RotavaultError {
    /// The resource names a secret store that is not in the context map.
    #[error("secret store '{0}' is not configured in the operation context")]
    UnknownStore(String),

    /// The operation was cancelled before its first external mutation.
    #[error("operation cancelled")]
    Cancelled,

    /// A secret store adapter failed below the read/write contract.
    #[error("secret store error: {0}")]
    Store(String),

    /// A cloud control-plane call failed below the null/false contract.
    #[error("cloud control plane error: {0}")]
    Cloud(String),

    /// A database connection or statement failed.
    #[error("database error: {0}")]
    Database(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
