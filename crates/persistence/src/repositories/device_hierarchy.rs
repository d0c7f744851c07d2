//! Device hierarchy repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DeviceRecordEntity;
use crate::metrics::QueryTimer;

/// Repository for devices, group memberships and the org/partner chain.
#[derive(Clone)]
pub struct DeviceHierarchyRepository {
    pool: PgPool,
}

impl DeviceHierarchyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_device(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_record");
        let result = sqlx::query_as::<_, DeviceRecordEntity>(
            r#"
            SELECT id, org_id, site_id
            FROM devices
            WHERE id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partner of an organization. `None` for an unknown org or one without a partner.
    pub async fn find_partner_id_for_org(&self, org_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("find_partner_id_for_org");
        let result = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            SELECT partner_id
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.flatten())
    }

    pub async fn list_group_ids_for_device(&self, device_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_ids_for_device");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT group_id
            FROM device_group_memberships
            WHERE device_id = $1
            ORDER BY group_id
            "#,
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_device_ids_in_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("list_device_ids_in_group");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT device_id
            FROM device_group_memberships
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_device_ids_in_site(&self, site_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("list_device_ids_in_site");
        let result = sqlx::query_scalar::<_, Uuid>("SELECT id FROM devices WHERE site_id = $1")
            .bind(site_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn list_device_ids_in_org(&self, org_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("list_device_ids_in_org");
        let result = sqlx::query_scalar::<_, Uuid>("SELECT id FROM devices WHERE org_id = $1")
            .bind(org_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn list_org_ids_for_partner(&self, partner_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("list_org_ids_for_partner");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM organizations
            WHERE partner_id = $1
            ORDER BY id
            "#,
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
