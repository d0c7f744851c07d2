//! Configuration policy entity definitions.

use chrono::{DateTime, Utc};
use domain::error::ParseEnumError;
use domain::models::{ActiveFeatureLink, ConfigPolicyAssignment, FeatureLink};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row of `config_policy_assignments`.
#[derive(Debug, Clone, FromRow)]
pub struct ConfigPolicyAssignmentEntity {
    pub id: Uuid,
    pub config_policy_id: Uuid,
    pub level: String,
    pub target_id: Uuid,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ConfigPolicyAssignmentEntity> for ConfigPolicyAssignment {
    type Error = ParseEnumError;

    fn try_from(entity: ConfigPolicyAssignmentEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            config_policy_id: entity.config_policy_id,
            level: entity.level.parse()?,
            target_id: entity.target_id,
            priority: entity.priority,
            created_at: entity.created_at,
        })
    }
}

/// Database row of `config_policy_feature_links`.
#[derive(Debug, Clone, FromRow)]
pub struct FeatureLinkEntity {
    pub id: Uuid,
    pub config_policy_id: Uuid,
    pub feature_type: String,
    pub feature_policy_id: Option<Uuid>,
    pub inline_settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FeatureLinkEntity> for FeatureLink {
    type Error = ParseEnumError;

    fn try_from(entity: FeatureLinkEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            config_policy_id: entity.config_policy_id,
            feature_type: entity.feature_type.parse()?,
            feature_policy_id: entity.feature_policy_id,
            inline_settings: entity.inline_settings,
            created_at: entity.created_at,
        })
    }
}

/// Feature link joined with its (active) policy.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveFeatureLinkEntity {
    #[sqlx(flatten)]
    pub link: FeatureLinkEntity,
    pub org_id: Uuid,
    pub policy_name: String,
}

impl TryFrom<ActiveFeatureLinkEntity> for ActiveFeatureLink {
    type Error = ParseEnumError;

    fn try_from(entity: ActiveFeatureLinkEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            link: entity.link.try_into()?,
            org_id: entity.org_id,
            policy_name: entity.policy_name,
        })
    }
}
