//! Builders for in-memory fleets used by the service tests.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::memory_store::InMemoryPolicyStore;
use crate::models::{
    AlertRuleSettings, AssignmentLevel, ConfigPolicyAssignment, ConfigurationPolicy, DeviceRecord,
    FeatureLink, FeaturePayload, FeatureType, MaintenanceSettings, PatchSettings, PolicyStatus,
};

pub fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .unwrap()
}

pub fn maintenance_settings(recurrence: &str, duration_hours: i32, timezone: &str) -> MaintenanceSettings {
    MaintenanceSettings {
        id: Uuid::new_v4(),
        feature_link_id: Uuid::nil(),
        recurrence: recurrence.to_string(),
        duration_hours,
        timezone: timezone.to_string(),
        window_start: None,
        suppress_alerts: true,
        suppress_patching: true,
        suppress_automations: true,
        suppress_scripts: true,
        notify_before_minutes: None,
    }
}

pub fn patch_settings(feature_link_id: Uuid) -> PatchSettings {
    PatchSettings {
        id: Uuid::new_v4(),
        feature_link_id,
        sources: vec!["os".to_string()],
        auto_approve: true,
        auto_approve_severities: vec!["critical".to_string()],
        schedule_frequency: "weekly".to_string(),
        schedule_time: "02:00".to_string(),
        schedule_day_of_week: Some("wed".to_string()),
        schedule_day_of_month: None,
        reboot_policy: "if_required".to_string(),
    }
}

/// A fleet of devices and policies backed by [`InMemoryPolicyStore`].
pub struct Fleet {
    pub store: Arc<InMemoryPolicyStore>,
    pub org_id: Uuid,
    pub site_id: Uuid,
}

impl Fleet {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryPolicyStore::new());
        let org_id = Uuid::new_v4();
        store.insert_org(org_id, None);
        Self {
            store,
            org_id,
            site_id: Uuid::new_v4(),
        }
    }

    pub fn with_partner(partner_id: Uuid) -> Self {
        let fleet = Self::new();
        fleet.store.insert_org(fleet.org_id, Some(partner_id));
        fleet
    }

    pub fn device(&self) -> Uuid {
        self.device_in(self.org_id, self.site_id)
    }

    pub fn device_in(&self, org_id: Uuid, site_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.store.insert_device(DeviceRecord { id, org_id, site_id });
        id
    }

    pub fn join_group(&self, device_id: Uuid, group_id: Uuid) {
        self.store.add_group_member(device_id, group_id);
    }

    pub fn policy(&self) -> Uuid {
        self.policy_with_status(PolicyStatus::Active)
    }

    pub fn policy_with_status(&self, status: PolicyStatus) -> Uuid {
        let id = Uuid::new_v4();
        let created = ts(2026, 1, 1, 0, 0, 0);
        self.store.insert_policy(ConfigurationPolicy {
            id,
            org_id: self.org_id,
            name: format!("Policy {}", &id.to_string()[..8]),
            status,
            created_at: created,
            updated_at: created,
        });
        id
    }

    /// Assignment created `created_offset_secs` after 2026-01-01.
    pub fn assign(
        &self,
        config_policy_id: Uuid,
        level: AssignmentLevel,
        target_id: Uuid,
        priority: i32,
        created_offset_secs: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store.insert_assignment(ConfigPolicyAssignment {
            id,
            config_policy_id,
            level,
            target_id,
            priority,
            created_at: ts(2026, 1, 1, 0, 0, 0) + chrono::Duration::seconds(created_offset_secs),
        });
        id
    }

    pub fn link(
        &self,
        config_policy_id: Uuid,
        feature_type: FeatureType,
        feature_policy_id: Option<Uuid>,
        inline_settings: Option<serde_json::Value>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store.insert_feature_link(FeatureLink {
            id,
            config_policy_id,
            feature_type,
            feature_policy_id,
            inline_settings,
            created_at: ts(2026, 1, 1, 0, 0, 0),
        });
        id
    }

    /// Policy with one alert rule link carrying the given rule names.
    pub fn alert_policy(&self, names: &[(&str, i32)]) -> Uuid {
        let policy = self.policy();
        let link = self.link(policy, FeatureType::AlertRule, None, None);
        for (name, sort_order) in names {
            self.store
                .insert_feature_settings(FeaturePayload::AlertRule(AlertRuleSettings {
                    id: Uuid::new_v4(),
                    feature_link_id: link,
                    name: name.to_string(),
                    severity: "warning".to_string(),
                    template_id: None,
                    conditions: json!({}),
                    cooldown_minutes: 5,
                    auto_resolve: false,
                    sort_order: *sort_order,
                }));
        }
        policy
    }

    /// Policy with one maintenance link carrying `settings`.
    pub fn maintenance_policy(&self, mut settings: MaintenanceSettings) -> Uuid {
        let policy = self.policy();
        let link = self.link(policy, FeatureType::Maintenance, None, None);
        settings.feature_link_id = link;
        self.store
            .insert_feature_settings(FeaturePayload::Maintenance(settings));
        policy
    }

    /// Policy whose software policy link points at `software_policy_id`.
    pub fn software_policy(&self, software_policy_id: Uuid) -> Uuid {
        let policy = self.policy();
        self.link(
            policy,
            FeatureType::SoftwarePolicy,
            Some(software_policy_id),
            None,
        );
        policy
    }
}
