//! Patch job routes.

use axum::{
    extract::{Path, State},
    http::{Extensions, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::models::ScanSummary;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::get_request_id;
use crate::middleware::metrics::{record_device_patch_job_created, record_patch_scan};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDevicePatchJobRequest {
    pub org_id: Uuid,
}

/// Create a patch job for one device from its winning patch settings.
///
/// 201 with the job, or 204 when the device is in a window that suppresses
/// patching or has no patch settings.
///
/// POST /api/v1/devices/:device_id/patch-jobs
pub async fn create_device_patch_job(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    extensions: Extensions,
    Json(request): Json<CreateDevicePatchJobRequest>,
) -> Result<Response, ApiError> {
    let created = state
        .patch_scheduler
        .create_patch_job_for_device_from_policy(device_id, request.org_id)
        .await?;

    match created {
        Some(job) => {
            record_device_patch_job_created();
            tracing::info!(
                request_id = %get_request_id(&extensions),
                job_id = %job.id,
                device_id = %device_id,
                "Device patch job created"
            );
            Ok((StatusCode::CREATED, Json(job)).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Run one patch schedule scan now.
///
/// POST /api/v1/patch-schedules/scan
pub async fn scan_patch_schedules(
    State(state): State<AppState>,
) -> Result<Json<ScanSummary>, ApiError> {
    let summary = state.patch_scheduler.scan_and_create_jobs().await?;
    record_patch_scan(&summary, "manual");
    Ok(Json(summary))
}
