//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod config_policy;
pub mod device_hierarchy;
pub mod feature_row;
pub mod maintenance_window;
pub mod patch_job;

pub use config_policy::{ActiveFeatureLinkEntity, ConfigPolicyAssignmentEntity, FeatureLinkEntity};
pub use device_hierarchy::DeviceRecordEntity;
pub use feature_row::{
    AlertRuleRowEntity, AssignmentRankEntity, AutomationRowEntity, ComplianceRuleRowEntity,
    MaintenanceSettingsRowEntity, PatchRingPolicyEntity, PatchSettingsRowEntity,
    SoftwarePolicyRowEntity,
};
pub use maintenance_window::StandaloneMaintenanceWindowEntity;
pub use patch_job::PatchJobEntity;
