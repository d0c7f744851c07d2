//! Background job scheduler and job implementations.

mod patch_schedule_scan;
mod pool_metrics;
mod scheduler;

pub use patch_schedule_scan::PatchScheduleScanJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{run_job, Job, JobFrequency, JobScheduler};
