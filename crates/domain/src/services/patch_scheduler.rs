//! Patch job creation from config-policy patch schedules.
//!
//! The scan runs once a minute. For every patch feature link of an active
//! policy it checks whether the schedule is due, skips windows that already
//! have a job, expands the policy's assignments into devices, drops devices
//! whose maintenance window suppresses patching and creates one job for the
//! rest. The insert is guarded by a unique `(config_policy_id, window_start)`
//! constraint, so concurrent scans create at most one job per window.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::device_targeting::expand_assignments;
use super::maintenance_status::MaintenanceStatusService;
use super::patch_schedule::PatchScheduleConfig;
use super::policy_resolution::PolicyResolver;
use super::store::{Clock, JobQueue, PolicyStore};
use crate::error::StoreError;
use crate::models::{
    ActiveFeatureLink, FeatureLink, FeatureType, NewPatchJob, PatchJob, PatchSettings, ScanSummary,
};

/// What happened to one feature link during a scan.
#[derive(Debug)]
enum LinkOutcome {
    NotDue,
    AlreadyScheduled,
    NoEligibleDevices,
    Created(PatchJob),
}

/// Creates patch jobs from schedules and on demand.
#[derive(Clone)]
pub struct PatchScheduler {
    store: Arc<dyn PolicyStore>,
    resolver: PolicyResolver,
    maintenance: MaintenanceStatusService,
    job_queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
}

impl PatchScheduler {
    pub fn new(
        resolver: PolicyResolver,
        maintenance: MaintenanceStatusService,
        job_queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: resolver.store().clone(),
            resolver,
            maintenance,
            job_queue,
            clock,
        }
    }

    /// Scan every active patch link and create the jobs that are due.
    ///
    /// A failing link is logged and counted; it never aborts the scan.
    pub async fn scan_and_create_jobs(&self) -> Result<ScanSummary, StoreError> {
        let now = self.clock.now();
        let links = self
            .store
            .list_active_feature_links(FeatureType::Patch)
            .await?;

        let mut summary = ScanSummary::default();

        for active in &links {
            summary.scanned += 1;

            match self.process_link(active, now).await {
                Ok(LinkOutcome::Created(job)) => {
                    summary.created += 1;
                    info!(
                        job_id = %job.id,
                        config_policy_id = %job.config_policy_id,
                        devices = job.device_ids.len(),
                        "Created scheduled patch job"
                    );
                }
                Ok(LinkOutcome::AlreadyScheduled) => {
                    summary.already_scheduled += 1;
                    debug!(
                        feature_link_id = %active.link.id,
                        "Patch job already exists for current window"
                    );
                }
                Ok(LinkOutcome::NotDue | LinkOutcome::NoEligibleDevices) => {}
                Err(e) => {
                    summary.failed += 1;
                    error!(
                        feature_link_id = %active.link.id,
                        config_policy_id = %active.link.config_policy_id,
                        error = %e,
                        "Failed to process patch schedule"
                    );
                }
            }
        }

        debug!(
            scanned = summary.scanned,
            created = summary.created,
            already_scheduled = summary.already_scheduled,
            failed = summary.failed,
            "Patch schedule scan finished"
        );

        Ok(summary)
    }

    async fn process_link(
        &self,
        active: &ActiveFeatureLink,
        now: DateTime<Utc>,
    ) -> Result<LinkOutcome, StoreError> {
        let link = &active.link;
        let schedule = PatchScheduleConfig::from_inline_settings(link.inline_settings.as_ref());

        if !schedule.is_due(now) {
            return Ok(LinkOutcome::NotDue);
        }
        let Some(window_start) = schedule.window_start(now) else {
            return Ok(LinkOutcome::NotDue);
        };

        if self
            .store
            .has_patch_job_since(link.config_policy_id, window_start)
            .await?
        {
            return Ok(LinkOutcome::AlreadyScheduled);
        }

        let assignments = self
            .store
            .list_assignments_for_policies(&[link.config_policy_id])
            .await?;
        let candidates = expand_assignments(self.store.as_ref(), &assignments).await?;
        let device_ids = self.without_patch_suppressed(candidates).await;

        if device_ids.is_empty() {
            debug!(
                feature_link_id = %link.id,
                "No devices eligible for scheduled patching"
            );
            return Ok(LinkOutcome::NoEligibleDevices);
        }

        let job = NewPatchJob {
            org_id: active.org_id,
            config_policy_id: link.config_policy_id,
            feature_link_id: link.id,
            name: format!("{} - scheduled patching", active.policy_name),
            config_snapshot: self.config_snapshot(link, None).await?,
            device_ids,
            window_start: Some(window_start),
            scheduled_at: now,
        };

        match self.create_and_enqueue(&job).await? {
            Some(created) => Ok(LinkOutcome::Created(created)),
            None => Ok(LinkOutcome::AlreadyScheduled),
        }
    }

    /// Drop devices under a maintenance window that suppresses patching.
    ///
    /// A device whose status cannot be read is dropped too and picked up by a
    /// later window.
    async fn without_patch_suppressed(&self, candidates: Vec<Uuid>) -> Vec<Uuid> {
        let mut eligible = Vec::with_capacity(candidates.len());
        for device_id in candidates {
            match self.maintenance.is_device_in_maintenance(device_id).await {
                Ok(status) if status.status.blocks_patching() => {
                    debug!(device_id = %device_id, "Skipping device in maintenance");
                }
                Ok(_) => eligible.push(device_id),
                Err(e) => {
                    warn!(
                        device_id = %device_id,
                        error = %e,
                        "Maintenance lookup failed, excluding device"
                    );
                }
            }
        }
        eligible
    }

    /// Create a patch job for one device from its winning patch settings.
    ///
    /// Returns `None` when the device is in a maintenance window that
    /// suppresses patching, has no patch settings or the settings' link is gone.
    pub async fn create_patch_job_for_device_from_policy(
        &self,
        device_id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<PatchJob>, StoreError> {
        let maintenance = self.maintenance.is_device_in_maintenance(device_id).await?;
        if maintenance.status.blocks_patching() {
            info!(device_id = %device_id, "Device in maintenance, patch job not created");
            return Ok(None);
        }

        let Some(settings) = self.resolver.resolve_patch_settings(device_id).await? else {
            debug!(device_id = %device_id, "No patch settings resolved");
            return Ok(None);
        };

        let Some(link) = self.store.find_feature_link(settings.feature_link_id).await? else {
            warn!(
                device_id = %device_id,
                feature_link_id = %settings.feature_link_id,
                "Patch settings reference a missing feature link"
            );
            return Ok(None);
        };

        let job = NewPatchJob {
            org_id,
            config_policy_id: link.config_policy_id,
            feature_link_id: link.id,
            name: "On-demand patching".to_string(),
            config_snapshot: self.config_snapshot(&link, Some(&settings)).await?,
            device_ids: vec![device_id],
            window_start: None,
            scheduled_at: self.clock.now(),
        };

        self.create_and_enqueue(&job).await
    }

    async fn create_and_enqueue(&self, job: &NewPatchJob) -> Result<Option<PatchJob>, StoreError> {
        let Some(created) = self.store.insert_patch_job(job).await? else {
            return Ok(None);
        };
        self.job_queue.enqueue_patch_job(&created).await?;
        Ok(Some(created))
    }

    /// Ring, category rules and auto-approve configuration at job creation time.
    async fn config_snapshot(
        &self,
        link: &FeatureLink,
        settings: Option<&PatchSettings>,
    ) -> Result<serde_json::Value, StoreError> {
        let ring = match link.feature_policy_id {
            Some(ring_id) => self.store.find_patch_ring_policy(ring_id).await?,
            None => None,
        };

        let mut snapshot = json!({
            "schedule": link.inline_settings.clone().unwrap_or_else(|| json!({})),
        });

        if let Some(ring) = ring {
            snapshot["ringId"] = json!(ring.id);
            snapshot["ringName"] = json!(ring.name);
            snapshot["ringOrder"] = json!(ring.ring_order);
            snapshot["deferralDays"] = json!(ring.deferral_days);
            snapshot["categoryRules"] = ring.category_rules;
            snapshot["autoApprove"] = ring.auto_approve;
        }

        if let Some(settings) = settings {
            snapshot["settings"] = json!(settings);
        }

        Ok(snapshot)
    }
}
