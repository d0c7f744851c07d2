//! Repository implementations for database operations.
//!
//! Repositories provide an abstraction layer over raw database queries.

pub mod config_policy;
pub mod device_hierarchy;
pub mod feature_resolution;
pub mod maintenance_window;
pub mod patch_job;

pub use config_policy::ConfigPolicyRepository;
pub use device_hierarchy::DeviceHierarchyRepository;
pub use feature_resolution::FeatureResolutionRepository;
pub use maintenance_window::MaintenanceWindowRepository;
pub use patch_job::PatchJobRepository;
