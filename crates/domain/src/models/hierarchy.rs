//! Device hierarchy models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config_policy::AssignmentLevel;

/// The columns of a device row the hierarchy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: Uuid,
    pub org_id: Uuid,
    pub site_id: Uuid,
}

/// Chain of scopes a device belongs to. Derived per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHierarchy {
    pub device_id: Uuid,
    pub org_id: Uuid,
    pub site_id: Uuid,
    pub partner_id: Option<Uuid>,
    /// Sorted and deduplicated.
    pub group_ids: Vec<Uuid>,
}

impl DeviceHierarchy {
    pub fn is_in_group(&self, group_id: Uuid) -> bool {
        self.group_ids.binary_search(&group_id).is_ok()
    }
}

/// One "this assignment could apply" predicate for a hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", content = "targets", rename_all = "snake_case")]
pub enum TargetCondition {
    Device(Uuid),
    /// Set membership over every group the device is in. Never empty.
    DeviceGroup(Vec<Uuid>),
    Site(Uuid),
    Organization(Uuid),
    Partner(Uuid),
}

impl TargetCondition {
    pub fn level(&self) -> AssignmentLevel {
        match self {
            Self::Device(_) => AssignmentLevel::Device,
            Self::DeviceGroup(_) => AssignmentLevel::DeviceGroup,
            Self::Site(_) => AssignmentLevel::Site,
            Self::Organization(_) => AssignmentLevel::Organization,
            Self::Partner(_) => AssignmentLevel::Partner,
        }
    }

    /// Whether an assignment at `level` targeting `target_id` satisfies this predicate.
    pub fn matches(&self, level: AssignmentLevel, target_id: Uuid) -> bool {
        if self.level() != level {
            return false;
        }
        match self {
            Self::DeviceGroup(group_ids) => group_ids.contains(&target_id),
            Self::Device(id) | Self::Site(id) | Self::Organization(id) | Self::Partner(id) => {
                *id == target_id
            }
        }
    }
}

/// OR over a condition list.
pub fn any_condition_matches(
    conditions: &[TargetCondition],
    level: AssignmentLevel,
    target_id: Uuid,
) -> bool {
    conditions.iter().any(|c| c.matches(level, target_id))
}
