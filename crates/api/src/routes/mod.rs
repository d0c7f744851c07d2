//! HTTP route handlers.

pub mod compliance;
pub mod device_policies;
pub mod health;
pub mod maintenance;
pub mod patch_jobs;
pub mod software_policies;
