//! Postgres-backed implementations of the domain store and job queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    ActiveFeatureLink, AssignedFeatureRow, ConfigPolicyAssignment, DeviceHierarchy, DeviceRecord,
    FeatureLink, FeatureType, NewPatchJob, PatchJob, PatchRingPolicy, StandaloneMaintenanceWindow,
    TargetCondition,
};
use domain::services::{JobQueue, PolicyStore};
use domain::StoreError;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::{
    ConfigPolicyRepository, DeviceHierarchyRepository, FeatureResolutionRepository,
    MaintenanceWindowRepository, PatchJobRepository,
};

/// [`PolicyStore`] over the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgPolicyStore {
    pool: PgPool,
    devices: DeviceHierarchyRepository,
    policies: ConfigPolicyRepository,
    features: FeatureResolutionRepository,
    windows: MaintenanceWindowRepository,
    patch_jobs: PatchJobRepository,
}

impl PgPolicyStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            devices: DeviceHierarchyRepository::new(pool.clone()),
            policies: ConfigPolicyRepository::new(pool.clone()),
            features: FeatureResolutionRepository::new(pool.clone()),
            windows: MaintenanceWindowRepository::new(pool.clone()),
            patch_jobs: PatchJobRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn convert_all<E, T>(entities: Vec<E>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<E, Error = domain::ParseEnumError>,
{
    entities
        .into_iter()
        .map(|entity| T::try_from(entity).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_device(&self, device_id: Uuid) -> Result<Option<DeviceRecord>, StoreError> {
        Ok(self.devices.find_device(device_id).await?.map(Into::into))
    }

    async fn find_partner_id_for_org(&self, org_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.devices.find_partner_id_for_org(org_id).await?)
    }

    async fn list_group_ids_for_device(&self, device_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.devices.list_group_ids_for_device(device_id).await?)
    }

    async fn find_assigned_feature_rows(
        &self,
        feature_type: FeatureType,
        conditions: &[TargetCondition],
    ) -> Result<Vec<AssignedFeatureRow>, StoreError> {
        self.features
            .find_assigned_feature_rows(feature_type, conditions)
            .await
    }

    async fn list_assignments_for_policies(
        &self,
        config_policy_ids: &[Uuid],
    ) -> Result<Vec<ConfigPolicyAssignment>, StoreError> {
        if config_policy_ids.is_empty() {
            return Ok(Vec::new());
        }
        let entities = self
            .policies
            .list_assignments_for_policies(config_policy_ids)
            .await?;
        convert_all(entities)
    }

    async fn list_device_ids_in_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.devices.list_device_ids_in_group(group_id).await?)
    }

    async fn list_device_ids_in_site(&self, site_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.devices.list_device_ids_in_site(site_id).await?)
    }

    async fn list_device_ids_in_org(&self, org_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.devices.list_device_ids_in_org(org_id).await?)
    }

    async fn list_org_ids_for_partner(&self, partner_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.devices.list_org_ids_for_partner(partner_id).await?)
    }

    async fn find_feature_link(&self, link_id: Uuid) -> Result<Option<FeatureLink>, StoreError> {
        match self.policies.find_feature_link(link_id).await? {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list_active_feature_links(
        &self,
        feature_type: FeatureType,
    ) -> Result<Vec<ActiveFeatureLink>, StoreError> {
        let entities = self
            .policies
            .list_active_feature_links(feature_type.as_str())
            .await?;
        convert_all(entities)
    }

    async fn list_active_links_for_feature_policy(
        &self,
        feature_type: FeatureType,
        feature_policy_id: Uuid,
    ) -> Result<Vec<FeatureLink>, StoreError> {
        let entities = self
            .policies
            .list_active_links_for_feature_policy(feature_type.as_str(), feature_policy_id)
            .await?;
        convert_all(entities)
    }

    async fn find_patch_ring_policy(
        &self,
        ring_id: Uuid,
    ) -> Result<Option<PatchRingPolicy>, StoreError> {
        Ok(self
            .policies
            .find_patch_ring_policy(ring_id)
            .await?
            .map(Into::into))
    }

    async fn find_running_standalone_window(
        &self,
        hierarchy: &DeviceHierarchy,
        now: DateTime<Utc>,
    ) -> Result<Option<StandaloneMaintenanceWindow>, StoreError> {
        let entity = self
            .windows
            .find_running_window(
                hierarchy.org_id,
                now,
                hierarchy.device_id,
                hierarchy.site_id,
                &hierarchy.group_ids,
            )
            .await?;
        match entity {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn has_patch_job_since(
        &self,
        config_policy_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.patch_jobs.has_job_since(config_policy_id, since).await?)
    }

    async fn insert_patch_job(&self, job: &NewPatchJob) -> Result<Option<PatchJob>, StoreError> {
        match self.patch_jobs.insert(job).await? {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => {
                tracing::debug!(
                    config_policy_id = %job.config_policy_id,
                    window_start = ?job.window_start,
                    "Patch job already exists for window"
                );
                Ok(None)
            }
        }
    }
}

/// [`JobQueue`] that announces new jobs with `pg_notify` on the `patch_jobs` channel.
#[derive(Clone)]
pub struct PgNotifyJobQueue {
    patch_jobs: PatchJobRepository,
}

impl PgNotifyJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            patch_jobs: PatchJobRepository::new(pool),
        }
    }
}

/// Notification body sent for a new patch job.
pub fn patch_job_notification(job: &PatchJob) -> serde_json::Value {
    json!({
        "jobId": job.id,
        "orgId": job.org_id,
        "deviceCount": job.device_ids.len(),
    })
}

#[async_trait]
impl JobQueue for PgNotifyJobQueue {
    async fn enqueue_patch_job(&self, job: &PatchJob) -> Result<(), StoreError> {
        self.patch_jobs
            .notify(&patch_job_notification(job))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::PatchJobStatus;

    #[test]
    fn test_patch_job_notification_payload() {
        let now = Utc::now();
        let job = PatchJob {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            config_policy_id: Uuid::new_v4(),
            feature_link_id: Uuid::new_v4(),
            name: "Laptops - scheduled patching".to_string(),
            status: PatchJobStatus::Pending,
            config_snapshot: json!({}),
            device_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            window_start: Some(now),
            scheduled_at: now,
            created_at: now,
        };

        let payload = patch_job_notification(&job);
        assert_eq!(payload["jobId"], json!(job.id));
        assert_eq!(payload["orgId"], json!(job.org_id));
        assert_eq!(payload["deviceCount"], 2);
    }

    #[test]
    fn test_convert_all_reports_corrupt_rows() {
        use crate::entities::ConfigPolicyAssignmentEntity;

        let entity = ConfigPolicyAssignmentEntity {
            id: Uuid::new_v4(),
            config_policy_id: Uuid::new_v4(),
            level: "planet".to_string(),
            target_id: Uuid::new_v4(),
            priority: 0,
            created_at: Utc::now(),
        };
        let result: Result<Vec<ConfigPolicyAssignment>, _> = convert_all(vec![entity]);
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
