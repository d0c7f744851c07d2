//! Domain services for the fleet policy engine.
//!
//! Services contain the resolution, maintenance and scheduling logic. They run
//! against the [`PolicyStore`], [`JobQueue`] and [`Clock`] seams.

pub mod compliance;
pub mod device_targeting;
pub mod hierarchy;
pub mod maintenance_status;
pub mod maintenance_window;
pub mod memory_store;
pub mod patch_schedule;
pub mod patch_scheduler;
pub mod policy_resolution;
pub mod software_policy;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use compliance::{evaluate_rule, evaluate_rules, ComplianceService};
pub use device_targeting::{expand_assignment, expand_assignments};
pub use hierarchy::{build_target_conditions, load_hierarchy};
pub use maintenance_status::MaintenanceStatusService;
pub use maintenance_window::{is_maintenance_window_active, is_maintenance_window_active_at};
pub use memory_store::{InMemoryPolicyStore, RecordingJobQueue};
pub use patch_schedule::PatchScheduleConfig;
pub use patch_scheduler::PatchScheduler;
pub use policy_resolution::{
    select_winning_rows, AlertRules, Automations, ComplianceRules, Feature, MaintenanceFeature,
    PatchFeature, PolicyResolver, SoftwarePolicies,
};
pub use software_policy::{SoftwarePolicyTargeting, DEFAULT_VERIFY_BATCH_SIZE};
pub use store::{Clock, FixedClock, JobQueue, PolicyStore, SystemClock};
