//! Patch job domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParseEnumError;

/// Execution status of a patch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl PatchJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PatchJobStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEnumError::new("patch job status", other)),
        }
    }
}

/// Patch job domain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchJob {
    pub id: Uuid,
    pub org_id: Uuid,
    pub config_policy_id: Uuid,
    pub feature_link_id: Uuid,
    pub name: String,
    pub status: PatchJobStatus,
    /// Ring, category-rule and auto-approve configuration at creation time.
    pub config_snapshot: serde_json::Value,
    pub device_ids: Vec<Uuid>,
    /// Start of the schedule window the job belongs to. `None` for on-demand jobs.
    pub window_start: Option<DateTime<Utc>>,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a patch job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatchJob {
    pub org_id: Uuid,
    pub config_policy_id: Uuid,
    pub feature_link_id: Uuid,
    pub name: String,
    pub config_snapshot: serde_json::Value,
    pub device_ids: Vec<Uuid>,
    pub window_start: Option<DateTime<Utc>>,
    pub scheduled_at: DateTime<Utc>,
}

/// Result of one patch schedule scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    /// Jobs created.
    pub created: usize,
    /// Patch feature links examined.
    pub scanned: usize,
    /// Links that were due but already had a job for the window.
    pub already_scheduled: usize,
    /// Links whose processing failed. Retried on the next tick.
    pub failed: usize,
}
