//! Feature settings rows joined with the assignment that reaches a device.
//!
//! Every row entity flattens an [`AssignmentRankEntity`], selected as
//! `a.id AS assignment_id, a.config_policy_id, a.level AS assignment_level,
//! a.priority, a.created_at AS assignment_created_at`.

use chrono::{DateTime, Utc};
use domain::error::ParseEnumError;
use domain::models::{
    AlertRuleSettings, AssignedFeatureRow, AssignmentRank, AutomationSettings,
    ComplianceRuleSettings, FeaturePayload, MaintenanceSettings, PatchRingPolicy, PatchSettings,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Ranking columns of the assignment a row was reached through.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRankEntity {
    pub assignment_id: Uuid,
    pub config_policy_id: Uuid,
    pub assignment_level: String,
    pub priority: i32,
    pub assignment_created_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRankEntity> for AssignmentRank {
    type Error = ParseEnumError;

    fn try_from(entity: AssignmentRankEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            assignment_id: entity.assignment_id,
            config_policy_id: entity.config_policy_id,
            level: entity.assignment_level.parse()?,
            priority: entity.priority,
            created_at: entity.assignment_created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AlertRuleRowEntity {
    #[sqlx(flatten)]
    pub rank: AssignmentRankEntity,
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

impl TryFrom<AlertRuleRowEntity> for AssignedFeatureRow {
    type Error = ParseEnumError;

    fn try_from(entity: AlertRuleRowEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            rank: entity.rank.try_into()?,
            feature_link_id: entity.feature_link_id,
            payload: FeaturePayload::AlertRule(AlertRuleSettings {
                id: entity.id,
                feature_link_id: entity.feature_link_id,
                name: entity.name,
                severity: entity.severity,
                template_id: entity.template_id,
                conditions: entity.conditions,
                cooldown_minutes: entity.cooldown_minutes,
                auto_resolve: entity.auto_resolve,
                sort_order: entity.sort_order,
            }),
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AutomationRowEntity {
    #[sqlx(flatten)]
    pub rank: AssignmentRankEntity,
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

impl TryFrom<AutomationRowEntity> for AssignedFeatureRow {
    type Error = ParseEnumError;

    fn try_from(entity: AutomationRowEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            rank: entity.rank.try_into()?,
            feature_link_id: entity.feature_link_id,
            payload: FeaturePayload::Automation(AutomationSettings {
                id: entity.id,
                feature_link_id: entity.feature_link_id,
                name: entity.name,
                enabled: entity.enabled,
                trigger_type: entity.trigger_type,
                trigger_config: entity.trigger_config,
                actions: entity.actions,
                on_failure: entity.on_failure,
                sort_order: entity.sort_order,
            }),
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ComplianceRuleRowEntity {
    #[sqlx(flatten)]
    pub rank: AssignmentRankEntity,
    pub id: Uuid,
    pub feature_link_id: Uuid,
    pub name: String,
    pub rules: serde_json::Value,
    pub enforcement_level: String,
    pub check_interval_minutes: i32,
    pub remediation_script_id: Option<Uuid>,
    pub sort_order: i32,
}

impl TryFrom<ComplianceRuleRowEntity> for AssignedFeatureRow {
    type Error = ParseEnumError;

    fn try_from(entity: ComplianceRuleRowEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            rank: entity.rank.try_into()?,
            feature_link_id: entity.feature_link_id,
            payload: FeaturePayload::Compliance(ComplianceRuleSettings {
                id: entity.id,
                feature_link_id: entity.feature_link_id,
                name: entity.name,
                rules: entity.rules,
                enforcement_level: entity.enforcement_level,
                check_interval_minutes: entity.check_interval_minutes,
                remediation_script_id: entity.remediation_script_id,
                sort_order: entity.sort_order,
            }),
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PatchSettingsRowEntity {
    #[sqlx(flatten)]
    pub rank: AssignmentRankEntity,
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

impl TryFrom<PatchSettingsRowEntity> for AssignedFeatureRow {
    type Error = ParseEnumError;

    fn try_from(entity: PatchSettingsRowEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            rank: entity.rank.try_into()?,
            feature_link_id: entity.feature_link_id,
            payload: FeaturePayload::Patch(PatchSettings {
                id: entity.id,
                feature_link_id: entity.feature_link_id,
                sources: entity.sources,
                auto_approve: entity.auto_approve,
                auto_approve_severities: entity.auto_approve_severities,
                schedule_frequency: entity.schedule_frequency,
                schedule_time: entity.schedule_time,
                schedule_day_of_week: entity.schedule_day_of_week,
                schedule_day_of_month: entity.schedule_day_of_month,
                reboot_policy: entity.reboot_policy,
            }),
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MaintenanceSettingsRowEntity {
    #[sqlx(flatten)]
    pub rank: AssignmentRankEntity,
    pub id: Uuid,
    pub feature_link_id: Uuid,
    pub recurrence: String,
    pub duration_hours: i32,
    pub timezone: String,
    pub window_start: Option<String>,
    pub suppress_alerts: bool,
    pub suppress_patching: bool,
    pub suppress_automations: bool,
    pub suppress_scripts: bool,
    pub notify_before_minutes: Option<i32>,
}

impl TryFrom<MaintenanceSettingsRowEntity> for AssignedFeatureRow {
    type Error = ParseEnumError;

    fn try_from(entity: MaintenanceSettingsRowEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            rank: entity.rank.try_into()?,
            feature_link_id: entity.feature_link_id,
            payload: FeaturePayload::Maintenance(MaintenanceSettings {
                id: entity.id,
                feature_link_id: entity.feature_link_id,
                recurrence: entity.recurrence,
                duration_hours: entity.duration_hours,
                timezone: entity.timezone,
                window_start: entity.window_start,
                suppress_alerts: entity.suppress_alerts,
                suppress_patching: entity.suppress_patching,
                suppress_automations: entity.suppress_automations,
                suppress_scripts: entity.suppress_scripts,
                notify_before_minutes: entity.notify_before_minutes,
            }),
        })
    }
}

/// A software policy link reached through an assignment.
#[derive(Debug, Clone, FromRow)]
pub struct SoftwarePolicyRowEntity {
    #[sqlx(flatten)]
    pub rank: AssignmentRankEntity,
    pub feature_link_id: Uuid,
    pub feature_policy_id: Uuid,
}

impl TryFrom<SoftwarePolicyRowEntity> for AssignedFeatureRow {
    type Error = ParseEnumError;

    fn try_from(entity: SoftwarePolicyRowEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            rank: entity.rank.try_into()?,
            feature_link_id: entity.feature_link_id,
            payload: FeaturePayload::SoftwarePolicy(entity.feature_policy_id),
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PatchRingPolicyEntity {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub ring_order: i32,
    pub deferral_days: i32,
    pub category_rules: serde_json::Value,
    pub auto_approve: serde_json::Value,
}

impl From<PatchRingPolicyEntity> for PatchRingPolicy {
    fn from(entity: PatchRingPolicyEntity) -> Self {
        Self {
            id: entity.id,
            org_id: entity.org_id,
            name: entity.name,
            ring_order: entity.ring_order,
            deferral_days: entity.deferral_days,
            category_rules: entity.category_rules,
            auto_approve: entity.auto_approve,
        }
    }
}
