//! Config-policy hierarchy resolution.
//!
//! Resolves, for a device and a feature type, the settings of the winning
//! assignment:
//! 1. Load the device hierarchy (device, groups, site, organization, partner)
//! 2. Fetch every settings row of an active policy assigned at any of those levels
//! 3. Order by level specificity (device first), then priority, then age
//! 4. Keep the rows of the first assignment (list features) or the first row
//!
//! The six feature types share this routine and differ only in the payload they
//! extract, see [`Feature`].

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::hierarchy::{build_target_conditions, load_hierarchy};
use super::store::PolicyStore;
use crate::error::StoreError;
use crate::models::{
    AlertRuleSettings, AssignedFeatureRow, AutomationSettings, Cardinality,
    ComplianceRuleSettings, DeviceHierarchy, EffectiveConfiguration, FeaturePayload, FeatureType,
    MaintenanceSettings, PatchSettings,
};

/// A feature type and the settings it resolves to.
pub trait Feature {
    const TYPE: FeatureType;
    type Settings;

    fn extract(payload: FeaturePayload) -> Option<Self::Settings>;
}

pub struct AlertRules;
pub struct Automations;
pub struct ComplianceRules;
pub struct PatchFeature;
pub struct MaintenanceFeature;
pub struct SoftwarePolicies;

impl Feature for AlertRules {
    const TYPE: FeatureType = FeatureType::AlertRule;
    type Settings = AlertRuleSettings;

    fn extract(payload: FeaturePayload) -> Option<Self::Settings> {
        match payload {
            FeaturePayload::AlertRule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl Feature for Automations {
    const TYPE: FeatureType = FeatureType::Automation;
    type Settings = AutomationSettings;

    fn extract(payload: FeaturePayload) -> Option<Self::Settings> {
        match payload {
            FeaturePayload::Automation(automation) => Some(automation),
            _ => None,
        }
    }
}

impl Feature for ComplianceRules {
    const TYPE: FeatureType = FeatureType::Compliance;
    type Settings = ComplianceRuleSettings;

    fn extract(payload: FeaturePayload) -> Option<Self::Settings> {
        match payload {
            FeaturePayload::Compliance(rule) => Some(rule),
            _ => None,
        }
    }
}

impl Feature for PatchFeature {
    const TYPE: FeatureType = FeatureType::Patch;
    type Settings = PatchSettings;

    fn extract(payload: FeaturePayload) -> Option<Self::Settings> {
        match payload {
            FeaturePayload::Patch(settings) => Some(settings),
            _ => None,
        }
    }
}

impl Feature for MaintenanceFeature {
    const TYPE: FeatureType = FeatureType::Maintenance;
    type Settings = MaintenanceSettings;

    fn extract(payload: FeaturePayload) -> Option<Self::Settings> {
        match payload {
            FeaturePayload::Maintenance(settings) => Some(settings),
            _ => None,
        }
    }
}

impl Feature for SoftwarePolicies {
    const TYPE: FeatureType = FeatureType::SoftwarePolicy;
    type Settings = Uuid;

    fn extract(payload: FeaturePayload) -> Option<Self::Settings> {
        match payload {
            FeaturePayload::SoftwarePolicy(id) => Some(id),
            _ => None,
        }
    }
}

/// Pick the winning rows out of every row that reaches a device.
///
/// Rows are ordered by assignment precedence. `Many` keeps every row of the
/// first assignment ordered by `sort_order`; `Single` keeps the first row only.
pub fn select_winning_rows(
    mut rows: Vec<AssignedFeatureRow>,
    cardinality: Cardinality,
) -> Vec<AssignedFeatureRow> {
    rows.sort_by(|a, b| {
        a.rank
            .precedence(&b.rank)
            .then_with(|| a.feature_link_id.cmp(&b.feature_link_id))
    });

    let Some(winner) = rows.first().map(|row| row.rank.assignment_id) else {
        return rows;
    };

    match cardinality {
        Cardinality::Single => {
            rows.truncate(1);
            rows
        }
        Cardinality::Many => {
            let mut winning: Vec<AssignedFeatureRow> = rows
                .into_iter()
                .filter(|row| row.rank.assignment_id == winner)
                .collect();
            // Stable, so rows with equal sort_order keep link order.
            winning.sort_by_key(|row| row.payload.sort_order());
            winning
        }
    }
}

/// Resolves the settings that govern a device.
#[derive(Clone)]
pub struct PolicyResolver {
    store: Arc<dyn PolicyStore>,
}

impl PolicyResolver {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    pub async fn load_hierarchy(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceHierarchy>, StoreError> {
        load_hierarchy(self.store.as_ref(), device_id).await
    }

    /// Winning rows of `feature_type` for a device. Empty when the device is unknown.
    pub async fn resolve_feature(
        &self,
        device_id: Uuid,
        feature_type: FeatureType,
    ) -> Result<Vec<AssignedFeatureRow>, StoreError> {
        match self.load_hierarchy(device_id).await? {
            Some(hierarchy) => self.resolve_for_hierarchy(&hierarchy, feature_type).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn resolve_for_hierarchy(
        &self,
        hierarchy: &DeviceHierarchy,
        feature_type: FeatureType,
    ) -> Result<Vec<AssignedFeatureRow>, StoreError> {
        let conditions = build_target_conditions(hierarchy);
        let rows = self
            .store
            .find_assigned_feature_rows(feature_type, &conditions)
            .await?;
        let candidates = rows.len();

        let winning = select_winning_rows(rows, feature_type.cardinality());

        debug!(
            device_id = %hierarchy.device_id,
            feature_type = %feature_type,
            candidates,
            winning = winning.len(),
            "Resolved feature"
        );

        Ok(winning)
    }

    pub async fn resolve_many<F: Feature>(
        &self,
        hierarchy: &DeviceHierarchy,
    ) -> Result<Vec<F::Settings>, StoreError> {
        Ok(self
            .resolve_for_hierarchy(hierarchy, F::TYPE)
            .await?
            .into_iter()
            .filter_map(|row| F::extract(row.payload))
            .collect())
    }

    pub async fn resolve_single<F: Feature>(
        &self,
        hierarchy: &DeviceHierarchy,
    ) -> Result<Option<F::Settings>, StoreError> {
        Ok(self
            .resolve_for_hierarchy(hierarchy, F::TYPE)
            .await?
            .into_iter()
            .next()
            .and_then(|row| F::extract(row.payload)))
    }

    /// Resolve a list feature for a device by id.
    pub async fn resolve_list<F: Feature>(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<F::Settings>, StoreError> {
        match self.load_hierarchy(device_id).await? {
            Some(hierarchy) => self.resolve_many::<F>(&hierarchy).await,
            None => Ok(Vec::new()),
        }
    }

    /// Resolve a single-row feature for a device by id.
    pub async fn resolve_one<F: Feature>(
        &self,
        device_id: Uuid,
    ) -> Result<Option<F::Settings>, StoreError> {
        match self.load_hierarchy(device_id).await? {
            Some(hierarchy) => self.resolve_single::<F>(&hierarchy).await,
            None => Ok(None),
        }
    }

    pub async fn resolve_alert_rules(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<AlertRuleSettings>, StoreError> {
        self.resolve_list::<AlertRules>(device_id).await
    }

    pub async fn resolve_automations(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<AutomationSettings>, StoreError> {
        self.resolve_list::<Automations>(device_id).await
    }

    pub async fn resolve_compliance_rules(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<ComplianceRuleSettings>, StoreError> {
        self.resolve_list::<ComplianceRules>(device_id).await
    }

    pub async fn resolve_patch_settings(
        &self,
        device_id: Uuid,
    ) -> Result<Option<PatchSettings>, StoreError> {
        self.resolve_one::<PatchFeature>(device_id).await
    }

    pub async fn resolve_maintenance_settings(
        &self,
        device_id: Uuid,
    ) -> Result<Option<MaintenanceSettings>, StoreError> {
        self.resolve_one::<MaintenanceFeature>(device_id).await
    }

    pub async fn resolve_software_policy_id(
        &self,
        device_id: Uuid,
    ) -> Result<Option<Uuid>, StoreError> {
        self.resolve_one::<SoftwarePolicies>(device_id).await
    }

    /// Every feature for one device, from a single hierarchy load.
    pub async fn resolve_effective_configuration(
        &self,
        device_id: Uuid,
    ) -> Result<Option<EffectiveConfiguration>, StoreError> {
        let Some(hierarchy) = self.load_hierarchy(device_id).await? else {
            return Ok(None);
        };

        let (alert_rules, automations, compliance_rules, patch, maintenance, software_policy_id) =
            futures::try_join!(
                self.resolve_many::<AlertRules>(&hierarchy),
                self.resolve_many::<Automations>(&hierarchy),
                self.resolve_many::<ComplianceRules>(&hierarchy),
                self.resolve_single::<PatchFeature>(&hierarchy),
                self.resolve_single::<MaintenanceFeature>(&hierarchy),
                self.resolve_single::<SoftwarePolicies>(&hierarchy),
            )?;

        Ok(Some(EffectiveConfiguration {
            device_id,
            alert_rules,
            automations,
            compliance_rules,
            patch,
            maintenance,
            software_policy_id,
        }))
    }
}
