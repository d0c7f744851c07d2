//! Unified maintenance status of a device.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::maintenance_window::is_maintenance_window_active_at;
use super::policy_resolution::{MaintenanceFeature, PolicyResolver};
use super::store::Clock;
use crate::error::StoreError;
use crate::models::{DeviceMaintenanceStatus, MaintenanceSource, MaintenanceWindowStatus};

/// Combines config-policy maintenance settings with legacy standalone windows.
#[derive(Clone)]
pub struct MaintenanceStatusService {
    resolver: PolicyResolver,
    clock: Arc<dyn Clock>,
}

impl MaintenanceStatusService {
    pub fn new(resolver: PolicyResolver, clock: Arc<dyn Clock>) -> Self {
        Self { resolver, clock }
    }

    /// Status from the device's winning maintenance settings only.
    pub async fn check_device_maintenance_window(
        &self,
        device_id: Uuid,
    ) -> Result<MaintenanceWindowStatus, StoreError> {
        let status = match self.resolver.resolve_maintenance_settings(device_id).await? {
            Some(settings) => is_maintenance_window_active_at(&settings, self.clock.now()),
            None => MaintenanceWindowStatus::INACTIVE,
        };
        Ok(status)
    }

    /// Status from config-policy settings, falling back to standalone windows.
    ///
    /// Config-policy settings that exist but are not running do not stop the
    /// standalone lookup.
    pub async fn is_device_in_maintenance(
        &self,
        device_id: Uuid,
    ) -> Result<DeviceMaintenanceStatus, StoreError> {
        let Some(hierarchy) = self.resolver.load_hierarchy(device_id).await? else {
            return Ok(DeviceMaintenanceStatus::none());
        };
        let now = self.clock.now();

        if let Some(settings) = self
            .resolver
            .resolve_single::<MaintenanceFeature>(&hierarchy)
            .await?
        {
            let status = is_maintenance_window_active_at(&settings, now);
            if status.active {
                return Ok(DeviceMaintenanceStatus {
                    status,
                    source: MaintenanceSource::ConfigPolicy,
                    window_id: None,
                });
            }
        }

        let window = self
            .resolver
            .store()
            .find_running_standalone_window(&hierarchy, now)
            .await?;

        Ok(match window {
            Some(window) => {
                debug!(
                    device_id = %device_id,
                    window_id = %window.id,
                    "Device in standalone maintenance window"
                );
                DeviceMaintenanceStatus {
                    status: window.status(),
                    source: MaintenanceSource::Standalone,
                    window_id: Some(window.id),
                }
            }
            None => DeviceMaintenanceStatus::none(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AssignmentLevel, StandaloneMaintenanceWindow, StandaloneTargetType, StandaloneWindowStatus,
    };
    use crate::services::fixtures::{maintenance_settings, ts, Fleet};
    use crate::services::store::FixedClock;
    use chrono::{DateTime, Duration, Utc};

    fn service(fleet: &Fleet, now: DateTime<Utc>) -> MaintenanceStatusService {
        MaintenanceStatusService::new(
            PolicyResolver::new(fleet.store.clone()),
            Arc::new(FixedClock::new(now)),
        )
    }

    fn standalone(fleet: &Fleet, now: DateTime<Utc>) -> StandaloneMaintenanceWindow {
        StandaloneMaintenanceWindow {
            id: Uuid::new_v4(),
            org_id: fleet.org_id,
            name: "Datacenter move".to_string(),
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            target_type: StandaloneTargetType::Site,
            device_ids: vec![],
            site_ids: vec![fleet.site_id],
            group_ids: vec![],
            suppress_alerts: false,
            suppress_patching: true,
            suppress_automations: false,
            suppress_scripts: true,
            status: StandaloneWindowStatus::Scheduled,
        }
    }

    #[tokio::test]
    async fn test_config_policy_window_takes_precedence() {
        let fleet = Fleet::new();
        let device = fleet.device();
        let now = ts(2026, 2, 4, 1, 0, 0);
        let policy = fleet.maintenance_policy(maintenance_settings("daily", 2, "UTC"));
        fleet.assign(policy, AssignmentLevel::Device, device, 0, 0);
        fleet.store.insert_standalone_window(standalone(&fleet, now));

        let status = service(&fleet, now)
            .is_device_in_maintenance(device)
            .await
            .unwrap();
        assert_eq!(status.source, MaintenanceSource::ConfigPolicy);
        assert!(status.status.active);
        assert!(status.status.suppress_alerts);
        assert!(status.window_id.is_none());
    }

    #[tokio::test]
    async fn test_inactive_config_policy_falls_through_to_standalone() {
        let fleet = Fleet::new();
        let device = fleet.device();
        let now = ts(2026, 2, 4, 12, 0, 0);
        let policy = fleet.maintenance_policy(maintenance_settings("daily", 2, "UTC"));
        fleet.assign(policy, AssignmentLevel::Device, device, 0, 0);
        let window = standalone(&fleet, now);
        fleet.store.insert_standalone_window(window.clone());

        let service = service(&fleet, now);
        let config_only = service.check_device_maintenance_window(device).await.unwrap();
        assert!(!config_only.active);

        let status = service.is_device_in_maintenance(device).await.unwrap();
        assert_eq!(status.source, MaintenanceSource::Standalone);
        assert_eq!(status.window_id, Some(window.id));
        assert!(status.status.active);
        assert!(status.status.suppress_patching);
        assert!(!status.status.suppress_alerts);
    }

    #[tokio::test]
    async fn test_standalone_window_must_target_device() {
        let fleet = Fleet::new();
        let device = fleet.device();
        let now = ts(2026, 2, 4, 12, 0, 0);
        let mut window = standalone(&fleet, now);
        window.site_ids = vec![Uuid::new_v4()];
        fleet.store.insert_standalone_window(window);

        let mut closed = standalone(&fleet, now);
        closed.status = StandaloneWindowStatus::Completed;
        fleet.store.insert_standalone_window(closed);

        let status = service(&fleet, now)
            .is_device_in_maintenance(device)
            .await
            .unwrap();
        assert_eq!(status, DeviceMaintenanceStatus::none());
    }

    #[tokio::test]
    async fn test_group_targeted_standalone_window() {
        let fleet = Fleet::new();
        let device = fleet.device();
        let group = Uuid::new_v4();
        fleet.join_group(device, group);
        let now = ts(2026, 2, 4, 12, 0, 0);
        let mut window = standalone(&fleet, now);
        window.target_type = StandaloneTargetType::Group;
        window.group_ids = vec![group];
        fleet.store.insert_standalone_window(window);

        let status = service(&fleet, now)
            .is_device_in_maintenance(device)
            .await
            .unwrap();
        assert_eq!(status.source, MaintenanceSource::Standalone);
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_in_maintenance() {
        let fleet = Fleet::new();
        let service = service(&fleet, ts(2026, 2, 4, 12, 0, 0));
        let unknown = Uuid::new_v4();

        assert_eq!(
            service.is_device_in_maintenance(unknown).await.unwrap(),
            DeviceMaintenanceStatus::none()
        );
        assert!(!service
            .check_device_maintenance_window(unknown)
            .await
            .unwrap()
            .active);
    }
}
