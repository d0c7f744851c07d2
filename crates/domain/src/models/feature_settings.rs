//! Feature settings rows carried by configuration policies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config_policy::{AssignmentRank, FeatureType};

/// Alert rule attached to a feature link. Many per link, ordered by `sort_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleSettings {
    pub id: Uuid,
    pub feature_link_id: Uuid,
    pub name: String,
    pub severity: String,
    pub template_id: Option<Uuid>,
    pub conditions: serde_json::Value,
    pub cooldown_minutes: i32,
    pub auto_resolve: bool,
    pub sort_order: i32,
}

/// Automation attached to a feature link. Many per link, ordered by `sort_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSettings {
    pub id: Uuid,
    pub feature_link_id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub trigger_type: String,
    pub trigger_config: serde_json::Value,
    pub actions: serde_json::Value,
    pub on_failure: String,
    pub sort_order: i32,
}

/// Compliance rule attached to a feature link. Many per link, ordered by `sort_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRuleSettings {
    pub id: Uuid,
    pub feature_link_id: Uuid,
    pub name: String,
    /// Condition list, see [`crate::services::compliance`].
    pub rules: serde_json::Value,
    pub enforcement_level: String,
    pub check_interval_minutes: i32,
    pub remediation_script_id: Option<Uuid>,
    pub sort_order: i32,
}

/// Patch settings of a feature link (one per link).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSettings {
    pub id: Uuid,
    pub feature_link_id: Uuid,
    pub sources: Vec<String>,
    pub auto_approve: bool,
    pub auto_approve_severities: Vec<String>,
    pub schedule_frequency: String,
    pub schedule_time: String,
    pub schedule_day_of_week: Option<String>,
    pub schedule_day_of_month: Option<i32>,
    pub reboot_policy: String,
}

/// Maintenance settings of a feature link (one per link).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSettings {
    pub id: Uuid,
    pub feature_link_id: Uuid,
    /// `once`, `daily`, `weekly` or `monthly`. Anything else never activates.
    pub recurrence: String,
    pub duration_hours: i32,
    /// IANA zone name. Empty means UTC.
    #[serde(default)]
    pub timezone: String,
    /// Start of a `once` window.
    pub window_start: Option<String>,
    pub suppress_alerts: bool,
    pub suppress_patching: bool,
    pub suppress_automations: bool,
    pub suppress_scripts: bool,
    pub notify_before_minutes: Option<i32>,
}

/// Patch ring policy a patch feature link may reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRingPolicy {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub ring_order: i32,
    pub deferral_days: i32,
    pub category_rules: serde_json::Value,
    pub auto_approve: serde_json::Value,
}

/// A settings row of any feature type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "featureType", content = "settings", rename_all = "snake_case")]
pub enum FeaturePayload {
    AlertRule(AlertRuleSettings),
    Automation(AutomationSettings),
    Compliance(ComplianceRuleSettings),
    Patch(PatchSettings),
    Maintenance(MaintenanceSettings),
    /// The link's standalone software policy id.
    SoftwarePolicy(Uuid),
}

impl FeaturePayload {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            Self::AlertRule(_) => FeatureType::AlertRule,
            Self::Automation(_) => FeatureType::Automation,
            Self::Compliance(_) => FeatureType::Compliance,
            Self::Patch(_) => FeatureType::Patch,
            Self::Maintenance(_) => FeatureType::Maintenance,
            Self::SoftwarePolicy(_) => FeatureType::SoftwarePolicy,
        }
    }

    /// Link the row belongs to. Software policy payloads are the link itself.
    pub fn feature_link_id(&self) -> Option<Uuid> {
        match self {
            Self::AlertRule(rule) => Some(rule.feature_link_id),
            Self::Automation(automation) => Some(automation.feature_link_id),
            Self::Compliance(rule) => Some(rule.feature_link_id),
            Self::Patch(settings) => Some(settings.feature_link_id),
            Self::Maintenance(settings) => Some(settings.feature_link_id),
            Self::SoftwarePolicy(_) => None,
        }
    }

    /// Order within one assignment's rows. Single-row features always report 0.
    pub fn sort_order(&self) -> i32 {
        match self {
            Self::AlertRule(rule) => rule.sort_order,
            Self::Automation(automation) => automation.sort_order,
            Self::Compliance(rule) => rule.sort_order,
            Self::Patch(_) | Self::Maintenance(_) | Self::SoftwarePolicy(_) => 0,
        }
    }
}

/// A settings row joined with the assignment that makes it reach a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedFeatureRow {
    pub rank: AssignmentRank,
    pub feature_link_id: Uuid,
    pub payload: FeaturePayload,
}
