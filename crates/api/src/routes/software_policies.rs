//! Software policy targeting routes.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwarePolicyDevicesResponse {
    pub software_policy_id: Uuid,
    pub device_ids: Vec<Uuid>,
    pub count: usize,
}

/// Devices whose winning software policy is `policy_id`.
///
/// GET /api/v1/software-policies/:policy_id/devices
pub async fn list_software_policy_devices(
    State(state): State<AppState>,
    Path(policy_id): Path<Uuid>,
) -> Result<Json<SoftwarePolicyDevicesResponse>, ApiError> {
    let device_ids = state
        .software_policies
        .resolve_device_ids_for_software_policy(policy_id)
        .await?;

    Ok(Json(SoftwarePolicyDevicesResponse {
        software_policy_id: policy_id,
        count: device_ids.len(),
        device_ids,
    }))
}
