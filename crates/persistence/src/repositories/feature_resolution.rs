//! Feature resolution queries.
//!
//! One query per feature type returns every settings row of an active policy
//! together with the assignment that reaches the device. The assignment filter
//! is an OR over the device's target conditions; ordering and picking the
//! winner happen in the domain layer.

use domain::models::{AssignedFeatureRow, FeatureType, TargetCondition};
use domain::StoreError;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::entities::{
    AlertRuleRowEntity, AutomationRowEntity, ComplianceRuleRowEntity,
    MaintenanceSettingsRowEntity, PatchSettingsRowEntity, SoftwarePolicyRowEntity,
};
use crate::metrics::QueryTimer;

const RANK_COLUMNS: &str = "a.id AS assignment_id, a.config_policy_id, \
     a.level AS assignment_level, a.priority, a.created_at AS assignment_created_at";

/// Columns and source table of a feature's settings rows.
fn feature_source(feature_type: FeatureType) -> (&'static str, Option<&'static str>) {
    match feature_type {
        FeatureType::AlertRule => (
            "s.id, s.feature_link_id, s.name, s.severity, s.template_id, s.conditions, \
             s.cooldown_minutes, s.auto_resolve, s.sort_order",
            Some("config_policy_alert_rules"),
        ),
        FeatureType::Automation => (
            "s.id, s.feature_link_id, s.name, s.enabled, s.trigger_type, s.trigger_config, \
             s.actions, s.on_failure, s.sort_order",
            Some("config_policy_automations"),
        ),
        FeatureType::Compliance => (
            "s.id, s.feature_link_id, s.name, s.rules, s.enforcement_level, \
             s.check_interval_minutes, s.remediation_script_id, s.sort_order",
            Some("config_policy_compliance_rules"),
        ),
        FeatureType::Patch => (
            "s.id, s.feature_link_id, s.sources, s.auto_approve, s.auto_approve_severities, \
             s.schedule_frequency, s.schedule_time, s.schedule_day_of_week, \
             s.schedule_day_of_month, s.reboot_policy",
            Some("config_policy_patch_settings"),
        ),
        FeatureType::Maintenance => (
            "s.id, s.feature_link_id, s.recurrence, s.duration_hours, s.timezone, \
             s.window_start, s.suppress_alerts, s.suppress_patching, s.suppress_automations, \
             s.suppress_scripts, s.notify_before_minutes",
            Some("config_policy_maintenance_settings"),
        ),
        FeatureType::SoftwarePolicy => ("fl.id AS feature_link_id, fl.feature_policy_id", None),
    }
}

/// Append `(level = $n AND target_id = $m) OR ...` for every condition.
///
/// The group condition matches with `= ANY(...)`. Callers never pass an empty
/// group list; an empty condition list matches nothing.
pub fn push_target_conditions(qb: &mut QueryBuilder<'_, Postgres>, conditions: &[TargetCondition]) {
    if conditions.is_empty() {
        qb.push(" AND FALSE");
        return;
    }

    qb.push(" AND (");
    for (index, condition) in conditions.iter().enumerate() {
        if index > 0 {
            qb.push(" OR ");
        }
        qb.push("(a.level = ");
        qb.push_bind(condition.level().as_str());
        match condition {
            TargetCondition::DeviceGroup(group_ids) => {
                qb.push(" AND a.target_id = ANY(");
                qb.push_bind(group_ids.clone());
                qb.push("))");
            }
            TargetCondition::Device(id)
            | TargetCondition::Site(id)
            | TargetCondition::Organization(id)
            | TargetCondition::Partner(id) => {
                qb.push(" AND a.target_id = ");
                qb.push_bind(*id);
                qb.push(")");
            }
        }
    }
    qb.push(")");
}

/// Build the assigned-rows query for a feature type.
pub fn build_assigned_rows_query<'a>(
    feature_type: FeatureType,
    conditions: &[TargetCondition],
) -> QueryBuilder<'a, Postgres> {
    let (columns, table) = feature_source(feature_type);
    let from = match table {
        Some(table) => format!(
            "FROM {table} s JOIN config_policy_feature_links fl ON fl.id = s.feature_link_id"
        ),
        None => "FROM config_policy_feature_links fl".to_string(),
    };

    let mut qb = QueryBuilder::new(format!(
        "SELECT {RANK_COLUMNS}, {columns} {from} \
         JOIN config_policies p ON p.id = fl.config_policy_id \
         JOIN config_policy_assignments a ON a.config_policy_id = p.id \
         WHERE p.status = 'active' AND fl.feature_type = "
    ));
    qb.push_bind(feature_type.as_str());

    if table.is_none() {
        qb.push(" AND fl.feature_policy_id IS NOT NULL");
    }

    push_target_conditions(&mut qb, conditions);
    qb
}

/// Repository for feature resolution queries.
#[derive(Clone)]
pub struct FeatureResolutionRepository {
    pool: PgPool,
}

impl FeatureResolutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch<E>(
        &self,
        feature_type: FeatureType,
        conditions: &[TargetCondition],
    ) -> Result<Vec<AssignedFeatureRow>, StoreError>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        AssignedFeatureRow: TryFrom<E, Error = domain::ParseEnumError>,
    {
        let timer = QueryTimer::new(format!("find_assigned_{}_rows", feature_type.as_str()));
        let mut qb = build_assigned_rows_query(feature_type, conditions);
        let result = qb.build_query_as::<E>().fetch_all(&self.pool).await;
        timer.record();

        result?
            .into_iter()
            .map(|entity| AssignedFeatureRow::try_from(entity).map_err(StoreError::from))
            .collect()
    }

    pub async fn find_assigned_feature_rows(
        &self,
        feature_type: FeatureType,
        conditions: &[TargetCondition],
    ) -> Result<Vec<AssignedFeatureRow>, StoreError> {
        match feature_type {
            FeatureType::AlertRule => self.fetch::<AlertRuleRowEntity>(feature_type, conditions).await,
            FeatureType::Automation => {
                self.fetch::<AutomationRowEntity>(feature_type, conditions).await
            }
            FeatureType::Compliance => {
                self.fetch::<ComplianceRuleRowEntity>(feature_type, conditions)
                    .await
            }
            FeatureType::Patch => {
                self.fetch::<PatchSettingsRowEntity>(feature_type, conditions)
                    .await
            }
            FeatureType::Maintenance => {
                self.fetch::<MaintenanceSettingsRowEntity>(feature_type, conditions)
                    .await
            }
            FeatureType::SoftwarePolicy => {
                self.fetch::<SoftwarePolicyRowEntity>(feature_type, conditions)
                    .await
            }
        }
    }
}
