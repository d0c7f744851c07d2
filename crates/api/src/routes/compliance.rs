//! Compliance evaluation routes.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::DeviceComplianceReport;
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Evaluate the device's winning compliance rules against reported facts.
///
/// POST /api/v1/devices/:device_id/compliance/evaluate
pub async fn evaluate_device_compliance(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Json(facts): Json<Value>,
) -> Result<Json<DeviceComplianceReport>, ApiError> {
    if !facts.is_object() {
        return Err(ApiError::Validation(
            "Device facts must be a JSON object".to_string(),
        ));
    }

    let report = state.compliance.evaluate_device(device_id, &facts).await?;

    tracing::debug!(
        device_id = %device_id,
        overall = ?report.overall,
        rules = report.rules.len(),
        "Compliance evaluated"
    );

    Ok(Json(report))
}
