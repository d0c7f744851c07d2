//! Patch job repository.

use chrono::{DateTime, Utc};
use domain::models::NewPatchJob;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PatchJobEntity;
use crate::metrics::QueryTimer;

/// Channel the patch worker listens on.
pub const PATCH_JOB_CHANNEL: &str = "patch_jobs";

/// Repository for the `patch_jobs` table.
#[derive(Clone)]
pub struct PatchJobRepository {
    pool: PgPool,
}

impl PatchJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn has_job_since(
        &self,
        config_policy_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_patch_job_since");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM patch_jobs
                WHERE config_policy_id = $1 AND created_at >= $2
            )
            "#,
        )
        .bind(config_policy_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a pending job. `None` when the policy already has a job for the window.
    pub async fn insert(&self, job: &NewPatchJob) -> Result<Option<PatchJobEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_patch_job");
        let result = sqlx::query_as::<_, PatchJobEntity>(
            r#"
            INSERT INTO patch_jobs (
                org_id, config_policy_id, feature_link_id, name, status,
                config_snapshot, device_ids, window_start, scheduled_at
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8)
            ON CONFLICT (config_policy_id, window_start) DO NOTHING
            RETURNING id, org_id, config_policy_id, feature_link_id, name, status,
                      config_snapshot, device_ids, window_start, scheduled_at, created_at
            "#,
        )
        .bind(job.org_id)
        .bind(job.config_policy_id)
        .bind(job.feature_link_id)
        .bind(&job.name)
        .bind(&job.config_snapshot)
        .bind(&job.device_ids)
        .bind(job.window_start)
        .bind(job.scheduled_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Wake the patch worker for a freshly created job.
    pub async fn notify(&self, payload: &serde_json::Value) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("notify_patch_job");
        let result = sqlx::query("SELECT pg_notify($1, $2)")
            .bind(PATCH_JOB_CHANNEL)
            .bind(payload.to_string())
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }
}
