//! Configuration policy repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    ActiveFeatureLinkEntity, ConfigPolicyAssignmentEntity, FeatureLinkEntity,
    PatchRingPolicyEntity,
};
use crate::metrics::QueryTimer;

/// Repository for policy assignments, feature links and patch rings.
#[derive(Clone)]
pub struct ConfigPolicyRepository {
    pool: PgPool,
}

impl ConfigPolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every assignment of the given policies, whatever their status.
    pub async fn list_assignments_for_policies(
        &self,
        config_policy_ids: &[Uuid],
    ) -> Result<Vec<ConfigPolicyAssignmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_assignments_for_policies");
        let result = sqlx::query_as::<_, ConfigPolicyAssignmentEntity>(
            r#"
            SELECT id, config_policy_id, level, target_id, priority, created_at
            FROM config_policy_assignments
            WHERE config_policy_id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(config_policy_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_feature_link(
        &self,
        link_id: Uuid,
    ) -> Result<Option<FeatureLinkEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_feature_link");
        let result = sqlx::query_as::<_, FeatureLinkEntity>(
            r#"
            SELECT id, config_policy_id, feature_type, feature_policy_id, inline_settings, created_at
            FROM config_policy_feature_links
            WHERE id = $1
            "#,
        )
        .bind(link_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Feature links of one type whose policy is active, with the policy's org and name.
    pub async fn list_active_feature_links(
        &self,
        feature_type: &str,
    ) -> Result<Vec<ActiveFeatureLinkEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_feature_links");
        let result = sqlx::query_as::<_, ActiveFeatureLinkEntity>(
            r#"
            SELECT fl.id, fl.config_policy_id, fl.feature_type, fl.feature_policy_id,
                   fl.inline_settings, fl.created_at,
                   p.org_id, p.name AS policy_name
            FROM config_policy_feature_links fl
            JOIN config_policies p ON p.id = fl.config_policy_id
            WHERE p.status = 'active' AND fl.feature_type = $1
            ORDER BY fl.created_at, fl.id
            "#,
        )
        .bind(feature_type)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_active_links_for_feature_policy(
        &self,
        feature_type: &str,
        feature_policy_id: Uuid,
    ) -> Result<Vec<FeatureLinkEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_links_for_feature_policy");
        let result = sqlx::query_as::<_, FeatureLinkEntity>(
            r#"
            SELECT fl.id, fl.config_policy_id, fl.feature_type, fl.feature_policy_id,
                   fl.inline_settings, fl.created_at
            FROM config_policy_feature_links fl
            JOIN config_policies p ON p.id = fl.config_policy_id
            WHERE p.status = 'active'
              AND fl.feature_type = $1
              AND fl.feature_policy_id = $2
            "#,
        )
        .bind(feature_type)
        .bind(feature_policy_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_patch_ring_policy(
        &self,
        ring_id: Uuid,
    ) -> Result<Option<PatchRingPolicyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_patch_ring_policy");
        let result = sqlx::query_as::<_, PatchRingPolicyEntity>(
            r#"
            SELECT id, org_id, name, ring_order, deferral_days, category_rules, auto_approve
            FROM patch_ring_policies
            WHERE id = $1
            "#,
        )
        .bind(ring_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
