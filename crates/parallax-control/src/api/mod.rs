//! HTTP API for the control service.
//!
//! Provides endpoints for:
//! - Tenant management (create, query, list, delete)
//! - Tenant environment variables
//! - Deployment records and queued-deployment cancellation
//! - Platform settings (credentials, normalized on write)
//! - Health and readiness checks

mod deployments;
mod envariables;
mod settings;
mod tenants;

use std::fmt::Write as _;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::credentials::EnvCredential;
use crate::deployment::DeploymentManager;
use crate::error::ControlError;
use crate::store::PlatformStore;

pub use deployments::{CancelQueuedRequest, CancelQueuedResponse, RecordDeploymentRequest};
pub use settings::UpdateSettingsRequest;
pub use tenants::CreateTenantRequest;

/// Shared application state for the control service.
#[derive(Clone)]
pub struct AppState {
    /// Deployment manager for cancellation and status refresh.
    pub manager: Arc<DeploymentManager>,
    /// Platform store for direct queries.
    pub store: Arc<dyn PlatformStore>,
    /// Configuration-derived fallback credential for normalization.
    pub env_credential: Option<EnvCredential>,
}

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Tenant management
        .route("/tenants", post(tenants::create_tenant))
        .route("/tenants", get(tenants::list_tenants))
        .route("/tenants/{id}", get(tenants::get_tenant))
        .route("/tenants/{id}", delete(tenants::delete_tenant))
        // Environment variables
        .route(
            "/tenants/{id}/envariables",
            post(envariables::create_env_variable),
        )
        .route(
            "/tenants/{id}/envariables",
            get(envariables::list_env_variables),
        )
        .route("/envariables/{id}", delete(envariables::delete_env_variable))
        // Deployments
        .route("/deployments", post(deployments::record_deployment))
        .route("/deployments", get(deployments::list_deployments))
        .route("/deployments/{id}", get(deployments::get_deployment))
        .route(
            "/deployments/cancel-queued",
            post(deployments::cancel_queued),
        )
        // Settings
        .route("/settings", get(settings::get_settings))
        .route("/settings", put(settings::update_settings))
        // Metrics
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Map a control error onto an HTTP status.
pub(super) const fn error_to_status(error: &ControlError) -> StatusCode {
    match error {
        ControlError::TenantNotFound(_)
        | ControlError::DeploymentNotFound(_)
        | ControlError::EnvVariableNotFound(_) => StatusCode::NOT_FOUND,
        ControlError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(super) fn error_response(error: &ControlError) -> (StatusCode, Json<ErrorResponse>) {
    (
        error_to_status(error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> (StatusCode, Json<ReadyResponse>) {
    match state.store.list_tenants().await {
        Ok(tenants) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                tenants: tenants.len(),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                tenants: 0,
            }),
        ),
    }
}

/// Metrics endpoint.
async fn metrics(axum::extract::State(state): axum::extract::State<AppState>) -> String {
    use crate::store::DeploymentFilter;
    use crate::types::DeploymentStatus;

    let mut output = String::new();

    let statuses = [
        ("queued", DeploymentStatus::Queued),
        ("building", DeploymentStatus::Building),
        ("ready", DeploymentStatus::Ready),
        ("error", DeploymentStatus::Error),
        ("canceled", DeploymentStatus::Canceled),
    ];

    output.push_str("# HELP control_deployments_total Number of deployment records by status\n");
    output.push_str("# TYPE control_deployments_total gauge\n");

    for (label, status) in statuses {
        let filter = DeploymentFilter::new().with_status(status);
        let count = state
            .store
            .list_deployments(&filter)
            .await
            .map(|d| d.len())
            .unwrap_or(0);
        let _ = writeln!(
            output,
            "control_deployments_total{{status=\"{label}\"}} {count}"
        );
    }

    let tenants = state.store.list_tenants().await.map(|t| t.len()).unwrap_or(0);
    output.push_str("# HELP control_tenants_total Number of tenants\n");
    output.push_str("# TYPE control_tenants_total gauge\n");
    let _ = writeln!(output, "control_tenants_total {tenants}");

    output
}

/// Health response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Readiness response.
#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    tenants: usize,
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint() {
        let (state, _store, _provider) = test_util::make_app_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint() {
        let (state, _store, _provider) = test_util::make_app_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint() {
        let (state, _store, _provider) = test_util::make_app_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
