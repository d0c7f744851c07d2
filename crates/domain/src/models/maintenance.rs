//! Maintenance window models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::hierarchy::DeviceHierarchy;
use crate::error::ParseEnumError;

/// Recurrence of a config-policy maintenance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Parse a stored recurrence. Unknown values yield `None` and the window never activates.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "once" => Some(Self::Once),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Whether a maintenance window is running and what it suppresses.
///
/// Suppression flags are only ever `true` while `active` is `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindowStatus {
    pub active: bool,
    pub suppress_alerts: bool,
    pub suppress_patching: bool,
    pub suppress_automations: bool,
    pub suppress_scripts: bool,
}

impl MaintenanceWindowStatus {
    pub const INACTIVE: Self = Self {
        active: false,
        suppress_alerts: false,
        suppress_patching: false,
        suppress_automations: false,
        suppress_scripts: false,
    };

    pub fn blocks_patching(&self) -> bool {
        self.active && self.suppress_patching
    }
}

/// Where a device's maintenance status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceSource {
    ConfigPolicy,
    Standalone,
    None,
}

/// Unified maintenance status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMaintenanceStatus {
    #[serde(flatten)]
    pub status: MaintenanceWindowStatus,
    pub source: MaintenanceSource,
    /// Set when the status comes from a standalone window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<Uuid>,
}

impl DeviceMaintenanceStatus {
    pub fn none() -> Self {
        Self {
            status: MaintenanceWindowStatus::INACTIVE,
            source: MaintenanceSource::None,
            window_id: None,
        }
    }
}

/// Targeting mode of a legacy standalone maintenance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandaloneTargetType {
    All,
    Device,
    Site,
    Group,
}

impl StandaloneTargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Device => "device",
            Self::Site => "site",
            Self::Group => "group",
        }
    }
}

impl FromStr for StandaloneTargetType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "device" => Ok(Self::Device),
            "site" => Ok(Self::Site),
            "group" => Ok(Self::Group),
            other => Err(ParseEnumError::new("maintenance target type", other)),
        }
    }
}

/// Lifecycle status of a legacy standalone maintenance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandaloneWindowStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl StandaloneWindowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses considered when looking for a running window.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Active)
    }
}

impl FromStr for StandaloneWindowStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEnumError::new("maintenance window status", other)),
        }
    }
}

/// Row of the legacy `maintenance_windows` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandaloneMaintenanceWindow {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub target_type: StandaloneTargetType,
    pub device_ids: Vec<Uuid>,
    pub site_ids: Vec<Uuid>,
    pub group_ids: Vec<Uuid>,
    pub suppress_alerts: bool,
    pub suppress_patching: bool,
    pub suppress_automations: bool,
    pub suppress_scripts: bool,
    pub status: StandaloneWindowStatus,
}

impl StandaloneMaintenanceWindow {
    /// Open status and `start_time <= now <= end_time` (both bounds inclusive).
    pub fn is_running_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.start_time <= now && now <= self.end_time
    }

    pub fn targets(&self, hierarchy: &DeviceHierarchy) -> bool {
        if self.org_id != hierarchy.org_id {
            return false;
        }
        match self.target_type {
            StandaloneTargetType::All => true,
            StandaloneTargetType::Device => self.device_ids.contains(&hierarchy.device_id),
            StandaloneTargetType::Site => self.site_ids.contains(&hierarchy.site_id),
            StandaloneTargetType::Group => {
                self.group_ids.iter().any(|g| hierarchy.is_in_group(*g))
            }
        }
    }

    pub fn status(&self) -> MaintenanceWindowStatus {
        MaintenanceWindowStatus {
            active: true,
            suppress_alerts: self.suppress_alerts,
            suppress_patching: self.suppress_patching,
            suppress_automations: self.suppress_automations,
            suppress_scripts: self.suppress_scripts,
        }
    }
}
