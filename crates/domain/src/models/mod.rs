//! Domain models for the fleet policy engine.

pub mod compliance;
pub mod config_policy;
pub mod effective_configuration;
pub mod feature_settings;
pub mod hierarchy;
pub mod maintenance;
pub mod patch_job;

pub use compliance::{ComplianceStatus, DeviceComplianceReport, RuleEvaluation};
pub use config_policy::{
    ActiveFeatureLink, AssignmentLevel, AssignmentRank, Cardinality, ConfigPolicyAssignment,
    ConfigurationPolicy, FeatureLink, FeatureType, PolicyStatus,
};
pub use effective_configuration::EffectiveConfiguration;
pub use feature_settings::{
    AlertRuleSettings, AssignedFeatureRow, AutomationSettings, ComplianceRuleSettings,
    FeaturePayload, MaintenanceSettings, PatchRingPolicy, PatchSettings,
};
pub use hierarchy::{any_condition_matches, DeviceHierarchy, DeviceRecord, TargetCondition};
pub use maintenance::{
    DeviceMaintenanceStatus, MaintenanceSource, MaintenanceWindowStatus, Recurrence,
    StandaloneMaintenanceWindow, StandaloneTargetType, StandaloneWindowStatus,
};
pub use patch_job::{NewPatchJob, PatchJob, PatchJobStatus, ScanSummary};
