//! Shared eligibility policy.
//!
//! Every strategy consults these checks before doing anything else. A
//! `Some(result)` is a short-circuit verdict the strategy returns as-is; a
//! `None` means the operation should proceed.

use crate::config::ResourceConfiguration;
use crate::context::RotationFlags;
use crate::rotation::RotationResult;
use crate::store::{SecretInfo, SecretStore};
use crate::Result;
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Decides whether an initialization should proceed.
///
/// An existing secret skips with `already initialized` unless `force` is on.
pub async fn check_initialization(
    resource: &ResourceConfiguration,
    store: &dyn SecretStore,
    flags: &RotationFlags,
) -> Result<Option<RotationResult>> {
    let existing = store.get_secret(&resource.name).await?;
    if existing.is_some() && !flags.force {
        tracing::debug!(secret = %resource.name, "skipping: already initialized");
        return Ok(Some(RotationResult::not_rotated(
            &resource.name,
            "already initialized; use force to overwrite",
        )));
    }
    Ok(None)
}

/// Decides whether a rotation should proceed.
///
/// An absent secret skips with `not found`; a secret outside its overlap
/// window skips with `not due` unless `force` is on.
pub async fn check_rotation(
    resource: &ResourceConfiguration,
    store: &dyn SecretStore,
    flags: &RotationFlags,
    now: DateTime<Utc>,
) -> Result<Option<RotationResult>> {
    let Some(info) = store.get_secret(&resource.name).await? else {
        tracing::debug!(secret = %resource.name, "skipping: not found");
        return Ok(Some(RotationResult::not_rotated(
            &resource.name,
            "secret not found; initialize it first",
        )));
    };

    if !flags.force && !should_rotate(&info, now, resource.expiration_overlap_days) {
        tracing::debug!(secret = %resource.name, expires_on = ?info.expires_on, "skipping: not due");
        let when = info
            .expires_on
            .map(|e| e.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .unwrap_or_else(|| "never".to_string());
        return Ok(Some(RotationResult::not_rotated(
            &resource.name,
            format!("not due for rotation; expires {when}"),
        )));
    }

    Ok(None)
}

/// Whether a secret is inside its rotation window.
///
/// A secret with no expiration is never due. Otherwise the remaining
/// lifetime is computed as a floating-point day count, and the secret is
/// due when `days_to_expire <= overlap_days`; the tie at exactly the
/// overlap boundary rotates.
pub fn should_rotate(info: &SecretInfo, now: DateTime<Utc>, overlap_days: f64) -> bool {
    let Some(expires_on) = info.expires_on else {
        return false;
    };
    let days_to_expire = (expires_on - now).num_milliseconds() as f64 / MILLIS_PER_DAY;
    days_to_expire <= overlap_days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn info(expires_on: Option<DateTime<Utc>>) -> SecretInfo {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        SecretInfo {
            id: "m/s1".to_string(),
            name: "s1".to_string(),
            content_type: Some("text/plain".to_string()),
            enabled: true,
            created_on: created,
            expires_on,
            updated_on: created,
            store_id: "m".to_string(),
            version: None,
        }
    }

    #[test]
    fn test_no_expiration_never_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(!should_rotate(&info(None), now, 0.0));
        assert!(!should_rotate(&info(None), now, 365.0));
    }

    #[test]
    fn test_expired_secret_is_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let expired = info(Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap()));
        assert!(should_rotate(&expired, now, 0.0));
    }

    #[test]
    fn test_fresh_secret_not_due() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let fresh = info(Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap()));
        assert!(!should_rotate(&fresh, now, 0.0));
    }

    #[test]
    fn test_overlap_window_pulls_rotation_forward() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let expires = info(Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap()));
        // 29 days remain; a 30-day overlap makes it due, no overlap does not.
        assert!(should_rotate(&expires, now, 30.0));
        assert!(!should_rotate(&expires, now, 0.0));
    }

    #[test]
    fn test_exact_boundary_rotates() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let expires = info(Some(Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap()));
        assert!(should_rotate(&expires, now, 30.0));
    }

    #[test]
    fn test_fractional_days() {
        let now = Utc.with_ymd_and_hms(2025, 5, 29, 12, 0, 0).unwrap();
        let expires = info(Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap()));
        // Half a day remains.
        assert!(should_rotate(&expires, now, 0.75));
        assert!(!should_rotate(&expires, now, 0.25));
    }
}
