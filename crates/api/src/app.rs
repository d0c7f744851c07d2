use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    Clock, ComplianceService, JobQueue, MaintenanceStatusService, PatchScheduler, PolicyResolver,
    PolicyStore, SoftwarePolicyTargeting,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{
    compliance, device_policies, health, maintenance, patch_jobs, software_policies,
};

/// Shared handler state. Every service runs against the same store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn PolicyStore>,
    pub resolver: PolicyResolver,
    pub maintenance: MaintenanceStatusService,
    pub patch_scheduler: PatchScheduler,
    pub software_policies: SoftwarePolicyTargeting,
    pub compliance: ComplianceService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn PolicyStore>,
        job_queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = PolicyResolver::new(store.clone());
        let maintenance = MaintenanceStatusService::new(resolver.clone(), clock.clone());
        let patch_scheduler =
            PatchScheduler::new(resolver.clone(), maintenance.clone(), job_queue, clock);
        let software_policies = SoftwarePolicyTargeting::with_batch_size(
            resolver.clone(),
            config.resolution.software_policy_batch_size,
        );
        let compliance = ComplianceService::new(resolver.clone());

        Self {
            config: Arc::new(config),
            store,
            resolver,
            maintenance,
            patch_scheduler,
            software_policies,
            compliance,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let device_routes = Router::new()
        .route(
            "/api/v1/devices/:device_id/effective-configuration",
            get(device_policies::get_effective_configuration),
        )
        .route(
            "/api/v1/devices/:device_id/policies/:feature_type",
            get(device_policies::get_feature_policies),
        )
        .route(
            "/api/v1/devices/:device_id/maintenance",
            get(maintenance::get_device_maintenance),
        )
        .route(
            "/api/v1/devices/:device_id/compliance/evaluate",
            post(compliance::evaluate_device_compliance),
        )
        .route(
            "/api/v1/devices/:device_id/patch-jobs",
            post(patch_jobs::create_device_patch_job),
        );

    let policy_routes = Router::new()
        .route(
            "/api/v1/software-policies/:policy_id/devices",
            get(software_policies::list_software_policy_devices),
        )
        .route(
            "/api/v1/patch-schedules/scan",
            post(patch_jobs::scan_patch_schedules),
        );

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .merge(public_routes)
        .merge(device_routes)
        .merge(policy_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .with_state(state)
}
