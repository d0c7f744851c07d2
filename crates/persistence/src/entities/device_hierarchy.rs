//! Device hierarchy entity definitions.

use domain::models::DeviceRecord;
use sqlx::FromRow;
use uuid::Uuid;

/// The hierarchy columns of a device row.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct DeviceRecordEntity {
    pub id: Uuid,
    pub org_id: Uuid,
    pub site_id: Uuid,
}

impl From<DeviceRecordEntity> for DeviceRecord {
    fn from(entity: DeviceRecordEntity) -> Self {
        Self {
            id: entity.id,
            org_id: entity.org_id,
            site_id: entity.site_id,
        }
    }
}
