//! In-memory store and job queue for development and testing.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::store::{JobQueue, PolicyStore};
use crate::error::StoreError;
use crate::models::{
    any_condition_matches, ActiveFeatureLink, AssignedFeatureRow, ConfigPolicyAssignment,
    ConfigurationPolicy, DeviceHierarchy, DeviceRecord, FeatureLink, FeaturePayload, FeatureType,
    NewPatchJob, PatchJob, PatchJobStatus, PatchRingPolicy, StandaloneMaintenanceWindow,
    TargetCondition,
};

#[derive(Debug, Default)]
struct State {
    devices: Vec<DeviceRecord>,
    org_partners: HashMap<Uuid, Option<Uuid>>,
    memberships: Vec<(Uuid, Uuid)>,
    policies: Vec<ConfigurationPolicy>,
    assignments: Vec<ConfigPolicyAssignment>,
    links: Vec<FeatureLink>,
    settings: Vec<FeaturePayload>,
    rings: Vec<PatchRingPolicy>,
    standalone_windows: Vec<StandaloneMaintenanceWindow>,
    patch_jobs: Vec<PatchJob>,
    failing_devices: HashSet<Uuid>,
}

/// Policy store backed by plain vectors.
///
/// Mirrors the Postgres store's semantics, including the unique
/// `(config_policy_id, window_start)` constraint on patch jobs. Devices marked
/// with [`InMemoryPolicyStore::fail_device`] make every per-device lookup fail.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    state: RwLock<State>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an organization and its (optional) partner.
    pub fn insert_org(&self, org_id: Uuid, partner_id: Option<Uuid>) {
        self.write().org_partners.insert(org_id, partner_id);
    }

    pub fn insert_device(&self, device: DeviceRecord) {
        let mut state = self.write();
        state.org_partners.entry(device.org_id).or_insert(None);
        state.devices.push(device);
    }

    pub fn add_group_member(&self, device_id: Uuid, group_id: Uuid) {
        self.write().memberships.push((device_id, group_id));
    }

    pub fn insert_policy(&self, policy: ConfigurationPolicy) {
        self.write().policies.push(policy);
    }

    pub fn insert_assignment(&self, assignment: ConfigPolicyAssignment) {
        self.write().assignments.push(assignment);
    }

    pub fn insert_feature_link(&self, link: FeatureLink) {
        self.write().links.push(link);
    }

    pub fn insert_feature_settings(&self, payload: FeaturePayload) {
        self.write().settings.push(payload);
    }

    pub fn insert_patch_ring(&self, ring: PatchRingPolicy) {
        self.write().rings.push(ring);
    }

    pub fn insert_standalone_window(&self, window: StandaloneMaintenanceWindow) {
        self.write().standalone_windows.push(window);
    }

    /// Make every lookup keyed by this device fail.
    pub fn fail_device(&self, device_id: Uuid) {
        self.write().failing_devices.insert(device_id);
    }

    pub fn patch_jobs(&self) -> Vec<PatchJob> {
        self.read().patch_jobs.clone()
    }

    fn check_device(state: &State, device_id: Uuid) -> Result<(), StoreError> {
        if state.failing_devices.contains(&device_id) {
            return Err(StoreError::Unavailable(format!(
                "device {device_id} lookup failed"
            )));
        }
        Ok(())
    }

    fn payloads_for_link(state: &State, link: &FeatureLink) -> Vec<FeaturePayload> {
        if link.feature_type == FeatureType::SoftwarePolicy {
            return link
                .feature_policy_id
                .map(FeaturePayload::SoftwarePolicy)
                .into_iter()
                .collect();
        }
        state
            .settings
            .iter()
            .filter(|p| p.feature_type() == link.feature_type && p.feature_link_id() == Some(link.id))
            .cloned()
            .collect()
    }

    fn is_policy_active(state: &State, policy_id: Uuid) -> bool {
        state
            .policies
            .iter()
            .any(|p| p.id == policy_id && p.is_active())
    }
}

#[async_trait::async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_device(&self, device_id: Uuid) -> Result<Option<DeviceRecord>, StoreError> {
        let state = self.read();
        Self::check_device(&state, device_id)?;
        Ok(state.devices.iter().find(|d| d.id == device_id).copied())
    }

    async fn find_partner_id_for_org(&self, org_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.read().org_partners.get(&org_id).copied().flatten())
    }

    async fn list_group_ids_for_device(&self, device_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let state = self.read();
        Self::check_device(&state, device_id)?;
        Ok(state
            .memberships
            .iter()
            .filter(|(device, _)| *device == device_id)
            .map(|(_, group)| *group)
            .collect())
    }

    async fn find_assigned_feature_rows(
        &self,
        feature_type: FeatureType,
        conditions: &[TargetCondition],
    ) -> Result<Vec<AssignedFeatureRow>, StoreError> {
        let state = self.read();
        let mut rows = Vec::new();

        for link in state.links.iter().filter(|l| l.feature_type == feature_type) {
            if !Self::is_policy_active(&state, link.config_policy_id) {
                continue;
            }
            let payloads = Self::payloads_for_link(&state, link);
            let assignments = state.assignments.iter().filter(|a| {
                a.config_policy_id == link.config_policy_id
                    && any_condition_matches(conditions, a.level, a.target_id)
            });
            for assignment in assignments {
                for payload in &payloads {
                    rows.push(AssignedFeatureRow {
                        rank: assignment.rank(),
                        feature_link_id: link.id,
                        payload: payload.clone(),
                    });
                }
            }
        }

        Ok(rows)
    }

    async fn list_assignments_for_policies(
        &self,
        config_policy_ids: &[Uuid],
    ) -> Result<Vec<ConfigPolicyAssignment>, StoreError> {
        Ok(self
            .read()
            .assignments
            .iter()
            .filter(|a| config_policy_ids.contains(&a.config_policy_id))
            .cloned()
            .collect())
    }

    async fn list_device_ids_in_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .read()
            .memberships
            .iter()
            .filter(|(_, group)| *group == group_id)
            .map(|(device, _)| *device)
            .collect())
    }

    async fn list_device_ids_in_site(&self, site_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .read()
            .devices
            .iter()
            .filter(|d| d.site_id == site_id)
            .map(|d| d.id)
            .collect())
    }

    async fn list_device_ids_in_org(&self, org_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .read()
            .devices
            .iter()
            .filter(|d| d.org_id == org_id)
            .map(|d| d.id)
            .collect())
    }

    async fn list_org_ids_for_partner(&self, partner_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let mut orgs: Vec<Uuid> = self
            .read()
            .org_partners
            .iter()
            .filter(|(_, partner)| **partner == Some(partner_id))
            .map(|(org, _)| *org)
            .collect();
        orgs.sort();
        Ok(orgs)
    }

    async fn find_feature_link(&self, link_id: Uuid) -> Result<Option<FeatureLink>, StoreError> {
        Ok(self.read().links.iter().find(|l| l.id == link_id).cloned())
    }

    async fn list_active_feature_links(
        &self,
        feature_type: FeatureType,
    ) -> Result<Vec<ActiveFeatureLink>, StoreError> {
        let state = self.read();
        Ok(state
            .links
            .iter()
            .filter(|l| l.feature_type == feature_type)
            .filter_map(|link| {
                let policy = state
                    .policies
                    .iter()
                    .find(|p| p.id == link.config_policy_id && p.is_active())?;
                Some(ActiveFeatureLink {
                    link: link.clone(),
                    org_id: policy.org_id,
                    policy_name: policy.name.clone(),
                })
            })
            .collect())
    }

    async fn list_active_links_for_feature_policy(
        &self,
        feature_type: FeatureType,
        feature_policy_id: Uuid,
    ) -> Result<Vec<FeatureLink>, StoreError> {
        let state = self.read();
        Ok(state
            .links
            .iter()
            .filter(|l| {
                l.feature_type == feature_type
                    && l.feature_policy_id == Some(feature_policy_id)
                    && Self::is_policy_active(&state, l.config_policy_id)
            })
            .cloned()
            .collect())
    }

    async fn find_patch_ring_policy(
        &self,
        ring_id: Uuid,
    ) -> Result<Option<PatchRingPolicy>, StoreError> {
        Ok(self.read().rings.iter().find(|r| r.id == ring_id).cloned())
    }

    async fn find_running_standalone_window(
        &self,
        hierarchy: &DeviceHierarchy,
        now: DateTime<Utc>,
    ) -> Result<Option<StandaloneMaintenanceWindow>, StoreError> {
        let state = self.read();
        Self::check_device(&state, hierarchy.device_id)?;
        Ok(state
            .standalone_windows
            .iter()
            .filter(|w| w.is_running_at(now) && w.targets(hierarchy))
            .min_by_key(|w| w.start_time)
            .cloned())
    }

    async fn has_patch_job_since(
        &self,
        config_policy_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .read()
            .patch_jobs
            .iter()
            .any(|j| j.config_policy_id == config_policy_id && j.created_at >= since))
    }

    async fn insert_patch_job(&self, job: &NewPatchJob) -> Result<Option<PatchJob>, StoreError> {
        let mut state = self.write();
        if job.window_start.is_some()
            && state.patch_jobs.iter().any(|j| {
                j.config_policy_id == job.config_policy_id && j.window_start == job.window_start
            })
        {
            return Ok(None);
        }

        // created_at follows the job's scheduled time so injected clocks stay consistent.
        let created = PatchJob {
            id: Uuid::new_v4(),
            org_id: job.org_id,
            config_policy_id: job.config_policy_id,
            feature_link_id: job.feature_link_id,
            name: job.name.clone(),
            status: PatchJobStatus::Pending,
            config_snapshot: job.config_snapshot.clone(),
            device_ids: job.device_ids.clone(),
            window_start: job.window_start,
            scheduled_at: job.scheduled_at,
            created_at: job.scheduled_at,
        };
        state.patch_jobs.push(created.clone());
        Ok(Some(created))
    }
}

/// Job queue that records what it was given.
#[derive(Debug, Default)]
pub struct RecordingJobQueue {
    enqueued: Mutex<Vec<Uuid>>,
    simulate_failure: bool,
}

impl RecordingJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue whose every enqueue fails.
    pub fn failing() -> Self {
        Self {
            enqueued: Mutex::new(Vec::new()),
            simulate_failure: true,
        }
    }

    pub fn enqueued(&self) -> Vec<Uuid> {
        self.enqueued.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl JobQueue for RecordingJobQueue {
    async fn enqueue_patch_job(&self, job: &PatchJob) -> Result<(), StoreError> {
        if self.simulate_failure {
            tracing::warn!(job_id = %job.id, "Recording job queue simulating failure");
            return Err(StoreError::Unavailable("job queue unavailable".to_string()));
        }
        self.enqueued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(job.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentLevel, PolicyStatus};
    use chrono::TimeZone;

    fn policy(status: PolicyStatus) -> ConfigurationPolicy {
        let now = Utc::now();
        ConfigurationPolicy {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Baseline".to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_job(policy_id: Uuid, window_start: Option<DateTime<Utc>>) -> NewPatchJob {
        NewPatchJob {
            org_id: Uuid::new_v4(),
            config_policy_id: policy_id,
            feature_link_id: Uuid::new_v4(),
            name: "Patch".to_string(),
            config_snapshot: serde_json::json!({}),
            device_ids: vec![Uuid::new_v4()],
            window_start,
            scheduled_at: Utc.with_ymd_and_hms(2026, 2, 4, 2, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_inactive_policy_rows_are_hidden() {
        let store = InMemoryPolicyStore::new();
        let device = Uuid::new_v4();
        let inactive = policy(PolicyStatus::Inactive);
        let link = FeatureLink {
            id: Uuid::new_v4(),
            config_policy_id: inactive.id,
            feature_type: FeatureType::SoftwarePolicy,
            feature_policy_id: Some(Uuid::new_v4()),
            inline_settings: None,
            created_at: Utc::now(),
        };
        store.insert_assignment(ConfigPolicyAssignment {
            id: Uuid::new_v4(),
            config_policy_id: inactive.id,
            level: AssignmentLevel::Device,
            target_id: device,
            priority: 0,
            created_at: Utc::now(),
        });
        store.insert_policy(inactive);
        store.insert_feature_link(link);

        let rows = store
            .find_assigned_feature_rows(
                FeatureType::SoftwarePolicy,
                &[TargetCondition::Device(device)],
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_insert_patch_job_enforces_window_uniqueness() {
        let store = InMemoryPolicyStore::new();
        let policy_id = Uuid::new_v4();
        let window = Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());

        assert!(store.insert_patch_job(&new_job(policy_id, window)).await.unwrap().is_some());
        assert!(store.insert_patch_job(&new_job(policy_id, window)).await.unwrap().is_none());
        // On-demand jobs carry no window and never conflict.
        assert!(store.insert_patch_job(&new_job(policy_id, None)).await.unwrap().is_some());
        assert!(store.insert_patch_job(&new_job(policy_id, None)).await.unwrap().is_some());
        assert_eq!(store.patch_jobs().len(), 3);
    }

    #[tokio::test]
    async fn test_failing_device_lookup() {
        let store = InMemoryPolicyStore::new();
        let device = Uuid::new_v4();
        store.fail_device(device);
        assert!(store.find_device(device).await.is_err());
        assert!(store.find_device(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recording_job_queue() {
        let queue = RecordingJobQueue::new();
        let store = InMemoryPolicyStore::new();
        let job = store
            .insert_patch_job(&new_job(Uuid::new_v4(), None))
            .await
            .unwrap()
            .unwrap();
        tokio_test::assert_ok!(queue.enqueue_patch_job(&job).await);
        assert_eq!(queue.enqueued(), vec![job.id]);

        let failing = RecordingJobQueue::failing();
        tokio_test::assert_err!(failing.enqueue_patch_job(&job).await);
        assert!(failing.enqueued().is_empty());
    }
}
