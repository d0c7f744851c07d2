//! Background job that turns due patch schedules into patch jobs.

use domain::services::PatchScheduler;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::record_patch_scan;

/// Scans every active patch schedule once per interval.
///
/// Schedules fire on an exact UTC minute, so the interval must stay at or
/// below 60 seconds. Duplicate ticks inside one minute are absorbed by the
/// per-window idempotency check.
pub struct PatchScheduleScanJob {
    scheduler: PatchScheduler,
    interval_secs: u64,
}

impl PatchScheduleScanJob {
    pub fn new(scheduler: PatchScheduler, interval_secs: u64) -> Self {
        Self {
            scheduler,
            interval_secs: interval_secs.clamp(1, 60),
        }
    }
}

#[async_trait::async_trait]
impl Job for PatchScheduleScanJob {
    fn name(&self) -> &'static str {
        "patch_schedule_scan"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let summary = self
            .scheduler
            .scan_and_create_jobs()
            .await
            .map_err(|e| format!("Patch schedule scan failed: {e}"))?;

        record_patch_scan(&summary, "scheduled");

        if summary.created > 0 || summary.failed > 0 {
            info!(
                created = summary.created,
                scanned = summary.scanned,
                already_scheduled = summary.already_scheduled,
                failed = summary.failed,
                "Patch schedule scan finished"
            );
        }
        Ok(())
    }
}
