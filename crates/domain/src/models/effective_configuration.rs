//! Every feature resolved for one device.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::feature_settings::{
    AlertRuleSettings, AutomationSettings, ComplianceRuleSettings, MaintenanceSettings,
    PatchSettings,
};

/// The winning settings of every feature type for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfiguration {
    pub device_id: Uuid,
    pub alert_rules: Vec<AlertRuleSettings>,
    pub automations: Vec<AutomationSettings>,
    pub compliance_rules: Vec<ComplianceRuleSettings>,
    pub patch: Option<PatchSettings>,
    pub maintenance: Option<MaintenanceSettings>,
    pub software_policy_id: Option<Uuid>,
}
