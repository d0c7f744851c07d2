//! Configuration policy domain models.
//!
//! A [`ConfigurationPolicy`] is an org-scoped container. It reaches devices through
//! [`ConfigPolicyAssignment`]s at one of five hierarchy levels, and carries feature
//! settings through [`FeatureLink`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParseEnumError;

/// Lifecycle status of a configuration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    Inactive,
    Archived,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "archived" => Ok(Self::Archived),
            other => Err(ParseEnumError::new("policy status", other)),
        }
    }
}

/// Configuration policy domain model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPolicy {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfigurationPolicy {
    /// Only active policies participate in resolution.
    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }
}

/// Hierarchy level an assignment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentLevel {
    Partner,
    Organization,
    Site,
    DeviceGroup,
    Device,
}

impl AssignmentLevel {
    pub const ALL: [AssignmentLevel; 5] = [
        Self::Partner,
        Self::Organization,
        Self::Site,
        Self::DeviceGroup,
        Self::Device,
    ];

    /// Specificity of the level. Higher is closer to the device and wins.
    pub fn specificity(&self) -> u8 {
        match self {
            Self::Device => 5,
            Self::DeviceGroup => 4,
            Self::Site => 3,
            Self::Organization => 2,
            Self::Partner => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Organization => "organization",
            Self::Site => "site",
            Self::DeviceGroup => "device_group",
            Self::Device => "device",
        }
    }
}

impl std::fmt::Display for AssignmentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("assignment level", s))
    }
}

/// Binds a configuration policy to one target at one hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPolicyAssignment {
    pub id: Uuid,
    pub config_policy_id: Uuid,
    pub level: AssignmentLevel,
    pub target_id: Uuid,
    /// Lower wins among assignments at the same level.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl ConfigPolicyAssignment {
    pub fn rank(&self) -> AssignmentRank {
        AssignmentRank {
            assignment_id: self.id,
            config_policy_id: self.config_policy_id,
            level: self.level,
            priority: self.priority,
            created_at: self.created_at,
        }
    }
}

/// The fields of an assignment that decide which one wins for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRank {
    pub assignment_id: Uuid,
    pub config_policy_id: Uuid,
    pub level: AssignmentLevel,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl AssignmentRank {
    /// Precedence order: closest level first, then lowest priority, then oldest.
    ///
    /// The trailing assignment-id comparison only makes the order total so that
    /// identical ranks resolve the same way on every call.
    pub fn precedence(&self, other: &Self) -> Ordering {
        other
            .level
            .specificity()
            .cmp(&self.level.specificity())
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.assignment_id.cmp(&other.assignment_id))
    }
}

/// Feature a configuration policy can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    AlertRule,
    Automation,
    Compliance,
    Patch,
    Maintenance,
    SoftwarePolicy,
}

/// How many settings rows a single assignment contributes for a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Ordered list of rows (by `sort_order`).
    Many,
    /// Exactly one row.
    Single,
}

impl FeatureType {
    pub const ALL: [FeatureType; 6] = [
        Self::AlertRule,
        Self::Automation,
        Self::Compliance,
        Self::Patch,
        Self::Maintenance,
        Self::SoftwarePolicy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlertRule => "alert_rule",
            Self::Automation => "automation",
            Self::Compliance => "compliance",
            Self::Patch => "patch",
            Self::Maintenance => "maintenance",
            Self::SoftwarePolicy => "software_policy",
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::AlertRule | Self::Automation | Self::Compliance => Cardinality::Many,
            Self::Patch | Self::Maintenance | Self::SoftwarePolicy => Cardinality::Single,
        }
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("feature type", s))
    }
}

/// Binds a configuration policy to one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureLink {
    pub id: Uuid,
    pub config_policy_id: Uuid,
    pub feature_type: FeatureType,
    /// Standalone feature policy this link points at (software policy, patch ring).
    pub feature_policy_id: Option<Uuid>,
    pub inline_settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A feature link of an active policy, with the owning policy's org and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFeatureLink {
    pub link: FeatureLink,
    pub org_id: Uuid,
    pub policy_name: String,
}
