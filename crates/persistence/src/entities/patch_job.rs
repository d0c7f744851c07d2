//! Patch job entity definitions.

use chrono::{DateTime, Utc};
use domain::error::ParseEnumError;
use domain::models::PatchJob;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row of `patch_jobs`.
#[derive(Debug, Clone, FromRow)]
pub struct PatchJobEntity {
    pub id: Uuid,
    pub org_id: Uuid,
    pub config_policy_id: Uuid,
    pub feature_link_id: Uuid,
    pub name: String,
    pub status: String,
    pub config_snapshot: serde_json::Value,
    pub device_ids: Vec<Uuid>,
    pub window_start: Option<DateTime<Utc>>,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PatchJobEntity> for PatchJob {
    type Error = ParseEnumError;

    fn try_from(entity: PatchJobEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            org_id: entity.org_id,
            config_policy_id: entity.config_policy_id,
            feature_link_id: entity.feature_link_id,
            name: entity.name,
            status: entity.status.parse()?,
            config_snapshot: entity.config_snapshot,
            device_ids: entity.device_ids,
            window_start: entity.window_start,
            scheduled_at: entity.scheduled_at,
            created_at: entity.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::PatchJobStatus;
    use serde_json::json;

    #[test]
    fn test_patch_job_entity_to_domain() {
        let now = Utc::now();
        let device = Uuid::new_v4();
        let entity = PatchJobEntity {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            config_policy_id: Uuid::new_v4(),
            feature_link_id: Uuid::new_v4(),
            name: "Servers - scheduled patching".to_string(),
            status: "pending".to_string(),
            config_snapshot: json!({"ringName": "Pilot"}),
            device_ids: vec![device],
            window_start: Some(now),
            scheduled_at: now,
            created_at: now,
        };

        let job: PatchJob = entity.try_into().unwrap();
        assert_eq!(job.status, PatchJobStatus::Pending);
        assert_eq!(job.device_ids, vec![device]);
        assert_eq!(job.config_snapshot["ringName"], "Pilot");
    }
}
