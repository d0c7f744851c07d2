//! Maintenance status routes.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::DeviceMaintenanceStatus;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Unified maintenance status of a device.
///
/// An unknown device reports `source: "none"` rather than 404, matching how
/// alerting and patching treat it.
///
/// GET /api/v1/devices/:device_id/maintenance
pub async fn get_device_maintenance(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
) -> Result<Json<DeviceMaintenanceStatus>, ApiError> {
    let status = state.maintenance.is_device_in_maintenance(device_id).await?;
    Ok(Json(status))
}
