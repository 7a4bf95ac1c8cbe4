//! Manual/generic strategy.
//!
//! For credentials issued by systems the engine cannot drive (partner API
//! keys, license tokens). The operator supplies the new value through
//! [`RotationFlags::secret_value`](crate::context::RotationFlags); the
//! strategy only persists it with a fresh expiration. No external I/O.

use crate::config::ResourceConfiguration;
use crate::context::{OperationContext, RotationFlags};
use crate::rotation::{eligibility, expires_at, RotationResult, Rotator};
use crate::store::SecretStore;
use crate::Result;
use async_trait::async_trait;

/// Rotator for operator-supplied secrets.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualSecretRotator;

impl ManualSecretRotator {
    /// Strategy tag.
    pub const STRATEGY_TYPE: &'static str = "manual/generic";

    /// Creates the rotator.
    pub fn new() -> Self {
        Self
    }

    async fn perform(
        &self,
        resource: &ResourceConfiguration,
        ctx: &OperationContext,
        flags: &RotationFlags,
    ) -> Result<RotationResult> {
        // An absent operator value is accepted and stored as the empty
        // string; the store does not distinguish.
        let value = flags.secret_value.clone().unwrap_or_default();

        if flags.what_if {
            return Ok(RotationResult::rotated(
                &resource.name,
                "Would have stored the operator-supplied value",
            ));
        }

        let store = ctx.store_for(resource)?;
        let expires_on = expires_at(ctx.clock().now(), resource.expiration_days);
        match store
            .update_secret(&resource.name, &value, Some(expires_on), &resource.content_type)
            .await?
        {
            Some(_) => Ok(RotationResult::rotated(
                &resource.name,
                "stored the operator-supplied value",
            )),
            None => Ok(RotationResult::not_rotated(
                &resource.name,
                "secret store update failed",
            )),
        }
    }
}

#[async_trait]
impl Rotator for ManualSecretRotator {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::memory::InMemorySecretStore;
    use crate::store::SecretStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn fixture(
        now: chrono::DateTime<Utc>,
    ) -> (Arc<InMemorySecretStore>, Arc<ManualClock>, OperationContext) {
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(InMemorySecretStore::with_clock("m", clock.clone()));
        let ctx = OperationContext::builder()
            .store("m", store.clone())
            .clock(clock.clone())
            .build();
        (store, clock, ctx)
    }

    fn resource() -> ResourceConfiguration {
        ResourceConfiguration::new("s1", ManualSecretRotator::STRATEGY_TYPE, "m")
    }

    #[tokio::test]
    async fn test_rotate_absent_secret_skips_not_found() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);

        let result = ManualSecretRotator::new()
            .rotate(&resource(), &ctx, &RotationFlags::new())
            .await
            .unwrap();

        assert!(!result.rotated);
        assert!(result.notes.contains("not found"));
        assert!(store.get_secret("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rotate_not_due_leaves_store_unchanged() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);
        let expires = Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap();
        store.seed("s1", "old", Some(expires), "text/plain").await;

        let result = ManualSecretRotator::new()
            .rotate(&resource(), &ctx, &RotationFlags::new().with_secret_value("new"))
            .await
            .unwrap();

        assert!(!result.rotated);
        assert!(result.notes.contains("not due"));
        let info = store.get_secret("s1").await.unwrap().unwrap();
        assert_eq!(info.expires_on, Some(expires));
        assert_eq!(store.get_secret_value("s1").await.unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_rotate_expired_secret_writes_new_value() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);
        let expires = Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap();
        store.seed("s1", "old", Some(expires), "text/plain").await;

        let result = ManualSecretRotator::new()
            .rotate(&resource(), &ctx, &RotationFlags::new().with_secret_value("new"))
            .await
            .unwrap();

        assert!(result.rotated);
        assert_eq!(store.get_secret_value("s1").await.unwrap().as_deref(), Some("new"));
        let info = store.get_secret("s1").await.unwrap().unwrap();
        assert_eq!(
            info.expires_on,
            Some(Utc.with_ymd_and_hms(2025, 8, 30, 0, 0, 0).unwrap())
        );
        assert_eq!(info.updated_on, now);
    }

    #[tokio::test]
    async fn test_rotate_inside_overlap_window() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);
        let expires = Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap();
        store.seed("s1", "old", Some(expires), "text/plain").await;

        let resource = resource().with_expiration_overlap_days(30.0);
        let result = ManualSecretRotator::new()
            .rotate(&resource, &ctx, &RotationFlags::new().with_secret_value("new"))
            .await
            .unwrap();

        assert!(result.rotated);
    }

    #[tokio::test]
    async fn test_force_rotates_even_when_not_due() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);
        store
            .seed(
                "s1",
                "old",
                Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap()),
                "text/plain",
            )
            .await;

        let flags = RotationFlags::new().with_force().with_secret_value("new");
        let result = ManualSecretRotator::new()
            .rotate(&resource(), &ctx, &flags)
            .await
            .unwrap();

        assert!(result.rotated);
        assert_eq!(store.get_secret_value("s1").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_initialize_skips_when_present() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);
        store.seed("s1", "old", None, "text/plain").await;

        let result = ManualSecretRotator::new()
            .initialize(&resource(), &ctx, &RotationFlags::new().with_secret_value("new"))
            .await
            .unwrap();

        assert!(!result.rotated);
        assert!(result.notes.contains("already initialized"));
        assert_eq!(store.get_secret_value("s1").await.unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_initialize_writes_when_absent() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);

        let result = ManualSecretRotator::new()
            .initialize(&resource(), &ctx, &RotationFlags::new().with_secret_value("v1"))
            .await
            .unwrap();

        assert!(result.rotated);
        assert_eq!(store.get_secret_value("s1").await.unwrap().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_what_if_reports_success_without_writing() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);
        store
            .seed(
                "s1",
                "old",
                Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap()),
                "text/plain",
            )
            .await;

        let flags = RotationFlags::new().with_what_if().with_secret_value("new");
        let result = ManualSecretRotator::new()
            .rotate(&resource(), &ctx, &flags)
            .await
            .unwrap();

        assert!(result.rotated);
        assert!(result.notes.contains("Would have"));
        assert_eq!(store.get_secret_value("s1").await.unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_store_write_failure_is_a_verdict() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);
        store
            .seed(
                "s1",
                "old",
                Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap()),
                "text/plain",
            )
            .await;
        store.fail_updates(true);

        let result = ManualSecretRotator::new()
            .rotate(&resource(), &ctx, &RotationFlags::new().with_secret_value("new"))
            .await
            .unwrap();

        assert!(!result.rotated);
        assert!(result.notes.contains("update failed"));
    }

    #[tokio::test]
    async fn test_missing_secret_value_stores_empty_string() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        let (store, _, ctx) = fixture(now);

        let result = ManualSecretRotator::new()
            .initialize(&resource(), &ctx, &RotationFlags::new())
            .await
            .unwrap();

        assert!(result.rotated);
        assert_eq!(store.get_secret_value("s1").await.unwrap().as_deref(), Some(""));
    }
}
