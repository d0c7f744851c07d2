//! Effective policy lookups for a single device.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{AssignedFeatureRow, EffectiveConfiguration, FeatureType};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Winning rows of one feature for a device, with the assignment each came from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePoliciesResponse {
    pub device_id: Uuid,
    pub feature_type: FeatureType,
    pub rows: Vec<AssignedFeatureRow>,
}

/// Every resolved feature for a device.
///
/// GET /api/v1/devices/:device_id/effective-configuration
pub async fn get_effective_configuration(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
) -> Result<Json<EffectiveConfiguration>, ApiError> {
    state
        .resolver
        .resolve_effective_configuration(device_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Device {device_id} not found")))
}

/// Winning rows of one feature type.
///
/// GET /api/v1/devices/:device_id/policies/:feature_type
pub async fn get_feature_policies(
    State(state): State<AppState>,
    Path((device_id, feature_type)): Path<(Uuid, String)>,
) -> Result<Json<FeaturePoliciesResponse>, ApiError> {
    let feature_type: FeatureType = feature_type
        .parse()
        .map_err(|e: domain::ParseEnumError| ApiError::Validation(e.to_string()))?;

    let hierarchy = state
        .resolver
        .load_hierarchy(device_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Device {device_id} not found")))?;

    let rows = state
        .resolver
        .resolve_for_hierarchy(&hierarchy, feature_type)
        .await?;

    Ok(Json(FeaturePoliciesResponse {
        device_id,
        feature_type,
        rows,
    }))
}
