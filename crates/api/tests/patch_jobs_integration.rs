//! Integration tests for patch scheduling endpoints.
//!
//! Run with: cargo test --test patch_jobs_integration

mod common;

use axum::http::{Method, StatusCode};
use chrono::{TimeZone, Utc};
use common::{json_request, parse_response_body, TestFleet};
use domain::models::AssignmentLevel;
use serde_json::json;
use tower::ServiceExt;

fn fleet_at(hour: u32, minute: u32, second: u32) -> TestFleet {
    TestFleet::new(Utc.with_ymd_and_hms(2026, 2, 4, hour, minute, second).unwrap())
}

#[tokio::test]
async fn test_scan_creates_one_job_per_window() {
    let fleet = fleet_at(2, 0, 30);
    let first = fleet.device();
    let second = fleet.device();
    let policy = fleet.patch_policy("Nightly", "02:00");
    fleet.assign(policy, AssignmentLevel::Organization, fleet.org_id, 0);

    let response = fleet
        .app()
        .oneshot(json_request(Method::POST, "/api/v1/patch-schedules/scan", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["created"], 1);
    assert_eq!(body["scanned"], 1);

    let jobs = fleet.store.patch_jobs();
    assert_eq!(jobs.len(), 1);
    let mut devices = jobs[0].device_ids.clone();
    devices.sort();
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(devices, expected);
    assert_eq!(jobs[0].name, "Nightly - scheduled patching");
    assert_eq!(fleet.queue.enqueued(), vec![jobs[0].id]);

    let response = fleet
        .app()
        .oneshot(json_request(Method::POST, "/api/v1/patch-schedules/scan", json!({})))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["created"], 0);
    assert_eq!(body["alreadyScheduled"], 1);
    assert_eq!(fleet.store.patch_jobs().len(), 1);
}

#[tokio::test]
async fn test_scan_outside_schedule_minute() {
    let fleet = fleet_at(2, 1, 0);
    fleet.device();
    let policy = fleet.patch_policy("Nightly", "02:00");
    fleet.assign(policy, AssignmentLevel::Organization, fleet.org_id, 0);

    let response = fleet
        .app()
        .oneshot(json_request(Method::POST, "/api/v1/patch-schedules/scan", json!({})))
        .await
        .unwrap();
    let body = parse_response_body(response).await;

    assert_eq!(body["scanned"], 1);
    assert_eq!(body["created"], 0);
    assert!(fleet.store.patch_jobs().is_empty());
}

#[tokio::test]
async fn test_scan_skips_devices_in_maintenance() {
    let fleet = fleet_at(2, 0, 0);
    let busy = fleet.device();
    let free = fleet.device();

    let patch = fleet.patch_policy("Nightly", "02:00");
    fleet.assign(patch, AssignmentLevel::Organization, fleet.org_id, 0);
    let maintenance = fleet.maintenance_policy(4);
    fleet.assign(maintenance, AssignmentLevel::Device, busy, 0);

    fleet
        .app()
        .oneshot(json_request(Method::POST, "/api/v1/patch-schedules/scan", json!({})))
        .await
        .unwrap();

    let jobs = fleet.store.patch_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].device_ids, vec![free]);
}

#[tokio::test]
async fn test_device_patch_job_created() {
    let fleet = fleet_at(12, 0, 0);
    let device = fleet.device();
    let policy = fleet.patch_policy("Workstations", "03:00");
    fleet.assign(policy, AssignmentLevel::Site, fleet.site_id, 0);

    let uri = format!("/api/v1/devices/{device}/patch-jobs");
    let response = fleet
        .app()
        .oneshot(json_request(Method::POST, &uri, json!({"orgId": fleet.org_id})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    assert_eq!(body["deviceIds"], json!([device]));
    assert_eq!(body["configPolicyId"], json!(policy));
    assert_eq!(body["status"], "pending");
    assert!(body["windowStart"].is_null());
    assert_eq!(body["configSnapshot"]["settings"]["rebootPolicy"], "if_required");
    assert_eq!(fleet.queue.enqueued().len(), 1);
}

#[tokio::test]
async fn test_device_patch_job_suppressed_by_maintenance() {
    let fleet = fleet_at(1, 0, 0);
    let device = fleet.device();
    let patch = fleet.patch_policy("Workstations", "03:00");
    fleet.assign(patch, AssignmentLevel::Organization, fleet.org_id, 0);
    let maintenance = fleet.maintenance_policy(2);
    fleet.assign(maintenance, AssignmentLevel::Organization, fleet.org_id, 0);

    let uri = format!("/api/v1/devices/{device}/patch-jobs");
    let response = fleet
        .app()
        .oneshot(json_request(Method::POST, &uri, json!({"orgId": fleet.org_id})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(fleet.store.patch_jobs().is_empty());
    assert!(fleet.queue.enqueued().is_empty());
}

#[tokio::test]
async fn test_device_patch_job_without_settings() {
    let fleet = fleet_at(12, 0, 0);
    let device = fleet.device();

    let uri = format!("/api/v1/devices/{device}/patch-jobs");
    let response = fleet
        .app()
        .oneshot(json_request(Method::POST, &uri, json!({"orgId": fleet.org_id})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_device_patch_job_requires_org_id() {
    let fleet = fleet_at(12, 0, 0);
    let device = fleet.device();

    let uri = format!("/api/v1/devices/{device}/patch-jobs");
    let response = fleet
        .app()
        .oneshot(json_request(Method::POST, &uri, json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
