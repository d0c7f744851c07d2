//! Standalone maintenance window entity definitions.

use chrono::{DateTime, Utc};
use domain::error::ParseEnumError;
use domain::models::StandaloneMaintenanceWindow;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row of `maintenance_windows`.
#[derive(Debug, Clone, FromRow)]
pub struct StandaloneMaintenanceWindowEntity {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub target_type: String,
    pub device_ids: Vec<Uuid>,
    pub site_ids: Vec<Uuid>,
    pub group_ids: Vec<Uuid>,
    pub suppress_alerts: bool,
    pub suppress_patching: bool,
    pub suppress_automations: bool,
    pub suppress_scripts: bool,
    pub status: String,
}

impl TryFrom<StandaloneMaintenanceWindowEntity> for StandaloneMaintenanceWindow {
    type Error = ParseEnumError;

    fn try_from(entity: StandaloneMaintenanceWindowEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            org_id: entity.org_id,
            name: entity.name,
            start_time: entity.start_time,
            end_time: entity.end_time,
            target_type: entity.target_type.parse()?,
            device_ids: entity.device_ids,
            site_ids: entity.site_ids,
            group_ids: entity.group_ids,
            suppress_alerts: entity.suppress_alerts,
            suppress_patching: entity.suppress_patching,
            suppress_automations: entity.suppress_automations,
            suppress_scripts: entity.suppress_scripts,
            status: entity.status.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::models::{StandaloneTargetType, StandaloneWindowStatus};

    fn entity(target_type: &str, status: &str) -> StandaloneMaintenanceWindowEntity {
        let now = Utc::now();
        StandaloneMaintenanceWindowEntity {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Firmware rollout".to_string(),
            start_time: now,
            end_time: now + Duration::hours(2),
            target_type: target_type.to_string(),
            device_ids: vec![],
            site_ids: vec![Uuid::new_v4()],
            group_ids: vec![],
            suppress_alerts: true,
            suppress_patching: true,
            suppress_automations: false,
            suppress_scripts: false,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_window_entity_to_domain() {
        let window: StandaloneMaintenanceWindow = entity("site", "active").try_into().unwrap();
        assert_eq!(window.target_type, StandaloneTargetType::Site);
        assert_eq!(window.status, StandaloneWindowStatus::Active);
        assert_eq!(window.site_ids.len(), 1);
    }

    #[test]
    fn test_window_entity_rejects_unknown_values() {
        assert!(StandaloneMaintenanceWindow::try_from(entity("rack", "active")).is_err());
        assert!(StandaloneMaintenanceWindow::try_from(entity("all", "paused")).is_err());
    }
}
