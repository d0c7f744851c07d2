//! Collaborator seams the domain services run against.
//!
//! The relational store, the job queue and the clock are injected so that every
//! service can be driven by the in-memory implementations in tests.

use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    ActiveFeatureLink, AssignedFeatureRow, ConfigPolicyAssignment, DeviceHierarchy, DeviceRecord,
    FeatureLink, FeatureType, NewPatchJob, PatchJob, PatchRingPolicy, StandaloneMaintenanceWindow,
    TargetCondition,
};

/// Relational query surface over devices, policies and jobs.
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Cheap connectivity check used by readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_device(&self, device_id: Uuid) -> Result<Option<DeviceRecord>, StoreError>;

    async fn find_partner_id_for_org(&self, org_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn list_group_ids_for_device(&self, device_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// Every settings row of `feature_type`, from active policies, reaching any of
    /// `conditions` through an assignment. Unordered.
    async fn find_assigned_feature_rows(
        &self,
        feature_type: FeatureType,
        conditions: &[TargetCondition],
    ) -> Result<Vec<AssignedFeatureRow>, StoreError>;

    async fn list_assignments_for_policies(
        &self,
        config_policy_ids: &[Uuid],
    ) -> Result<Vec<ConfigPolicyAssignment>, StoreError>;

    async fn list_device_ids_in_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn list_device_ids_in_site(&self, site_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn list_device_ids_in_org(&self, org_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn list_org_ids_for_partner(&self, partner_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn find_feature_link(&self, link_id: Uuid) -> Result<Option<FeatureLink>, StoreError>;

    /// Feature links of `feature_type` whose policy is active.
    async fn list_active_feature_links(
        &self,
        feature_type: FeatureType,
    ) -> Result<Vec<ActiveFeatureLink>, StoreError>;

    /// Feature links of `feature_type`, of active policies, pointing at `feature_policy_id`.
    async fn list_active_links_for_feature_policy(
        &self,
        feature_type: FeatureType,
        feature_policy_id: Uuid,
    ) -> Result<Vec<FeatureLink>, StoreError>;

    async fn find_patch_ring_policy(
        &self,
        ring_id: Uuid,
    ) -> Result<Option<PatchRingPolicy>, StoreError>;

    /// First legacy standalone window of the device's org that is open at `now`
    /// and targets the device.
    async fn find_running_standalone_window(
        &self,
        hierarchy: &DeviceHierarchy,
        now: DateTime<Utc>,
    ) -> Result<Option<StandaloneMaintenanceWindow>, StoreError>;

    async fn has_patch_job_since(
        &self,
        config_policy_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Insert a patch job. Returns `None` when a job for the same policy and
    /// schedule window already exists.
    async fn insert_patch_job(&self, job: &NewPatchJob) -> Result<Option<PatchJob>, StoreError>;
}

/// Hands created jobs to the execution side.
#[async_trait::async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue_patch_job(&self, job: &PatchJob) -> Result<(), StoreError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_set_and_advance() {
        let start = Utc.with_ymd_and_hms(2026, 2, 4, 2, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(1));
        assert_eq!(clock.now(), start + Duration::minutes(1));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
