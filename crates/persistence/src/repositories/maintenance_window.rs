//! Legacy standalone maintenance window repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::StandaloneMaintenanceWindowEntity;
use crate::metrics::QueryTimer;

/// Repository for the `maintenance_windows` table.
#[derive(Clone)]
pub struct MaintenanceWindowRepository {
    pool: PgPool,
}

impl MaintenanceWindowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Earliest-starting window of the org that is open at `now` and targets the device.
    pub async fn find_running_window(
        &self,
        org_id: Uuid,
        now: DateTime<Utc>,
        device_id: Uuid,
        site_id: Uuid,
        group_ids: &[Uuid],
    ) -> Result<Option<StandaloneMaintenanceWindowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_running_maintenance_window");
        let result = sqlx::query_as::<_, StandaloneMaintenanceWindowEntity>(
            r#"
            SELECT id, org_id, name, start_time, end_time, target_type,
                   device_ids, site_ids, group_ids,
                   suppress_alerts, suppress_patching, suppress_automations, suppress_scripts,
                   status
            FROM maintenance_windows
            WHERE org_id = $1
              AND status IN ('scheduled', 'active')
              AND start_time <= $2
              AND end_time >= $2
              AND (
                    target_type = 'all'
                 OR (target_type = 'device' AND $3 = ANY(device_ids))
                 OR (target_type = 'site' AND $4 = ANY(site_ids))
                 OR (target_type = 'group' AND group_ids && $5)
              )
            ORDER BY start_time, id
            LIMIT 1
            "#,
        )
        .bind(org_id)
        .bind(now)
        .bind(device_id)
        .bind(site_id)
        .bind(group_ids)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
