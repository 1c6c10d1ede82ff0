//! Deployment record endpoints, including queued-deployment cancellation.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::deployment::CancelItem;
use crate::error::ControlError;
use crate::store::DeploymentFilter;
use crate::types::{DeploymentRecord, DeploymentStatus, RecordId, TenantId};

use super::{error_response, AppState, ErrorResponse};

/// Request to record a new deployment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDeploymentRequest {
    /// Owning tenant, if any.
    pub tenant_id: Option<String>,
    /// Remote deployment identifier, if the deployment already exists on
    /// the provider.
    pub deployment_id: Option<String>,
    /// Public URL, when known.
    pub url: Option<String>,
}

/// Response for recording a deployment.
#[derive(Debug, Serialize)]
pub struct RecordDeploymentResponse {
    /// The assigned record ID.
    pub id: String,
}

/// Record a new deployment.
pub async fn record_deployment(
    State(state): State<AppState>,
    Json(request): Json<RecordDeploymentRequest>,
) -> Result<(StatusCode, Json<RecordDeploymentResponse>), (StatusCode, Json<ErrorResponse>)> {
    let record = DeploymentRecord::new(
        request.tenant_id.map(TenantId::new),
        request.deployment_id,
        request.url,
    );

    match state.manager.record_deployment(record).await {
        Ok(id) => Ok((
            StatusCode::CREATED,
            Json(RecordDeploymentResponse { id: id.to_string() }),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// Query parameters for listing deployments.
#[derive(Debug, Default, Deserialize)]
pub struct ListDeploymentsQuery {
    /// Filter by owning tenant.
    pub tenant_id: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

/// List deployment records.
pub async fn list_deployments(
    State(state): State<AppState>,
    Query(query): Query<ListDeploymentsQuery>,
) -> Result<Json<Vec<DeploymentRecord>>, (StatusCode, Json<ErrorResponse>)> {
    let mut filter = DeploymentFilter::new();

    if let Some(tenant_id) = query.tenant_id {
        filter = filter.with_tenant(TenantId::new(tenant_id));
    }
    if let Some(status) = query.status {
        let status: DeploymentStatus = status
            .parse()
            .map_err(|e: String| error_response(&ControlError::Config(e)))?;
        filter = filter.with_status(status);
    }
    if let Some(limit) = query.limit {
        filter = filter.with_limit(limit);
    }
    if let Some(offset) = query.offset {
        filter = filter.with_offset(offset);
    }

    match state.store.list_deployments(&filter).await {
        Ok(records) => Ok(Json(records)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Get a deployment record.
pub async fn get_deployment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeploymentRecord>, (StatusCode, Json<ErrorResponse>)> {
    let record_id = RecordId::new(&id);

    match state.manager.get(&record_id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(error_response(&ControlError::DeploymentNotFound(id))),
        Err(e) => Err(error_response(&e)),
    }
}

/// Request body for queued-deployment cancellation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelQueuedRequest {
    /// Restrict the batch to one tenant's deployments.
    pub tenant_id: Option<String>,
}

/// Response for queued-deployment cancellation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelQueuedResponse {
    /// Always `true`; per-item failures are reported in `results`.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Number of items whose local record was deleted.
    pub success_count: usize,
    /// Number of items that failed remotely.
    pub error_count: usize,
    /// Total number of queued records considered.
    pub total_processed: usize,
    /// Per-item outcomes, in processing order.
    pub results: Vec<CancelItem>,
}

/// Cancel all queued deployments, optionally limited to one tenant.
///
/// The body is parsed best-effort: a missing or malformed body means no
/// tenant filter, not a client error. The endpoint responds 200 even when
/// every item in the batch failed; only a failure to query the store at
/// all is surfaced as an error.
pub async fn cancel_queued(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CancelQueuedResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request: CancelQueuedRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        if !body.is_empty() {
            debug!(error = %e, "unparseable cancel body, proceeding without filter");
        }
        CancelQueuedRequest::default()
    });

    let tenant = request
        .tenant_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(TenantId::new);

    let report = state
        .manager
        .cancel_queued(tenant.as_ref())
        .await
        .map_err(|e| error_response(&e))?;

    info!(
        success = report.success_count,
        errors = report.error_count,
        "cancellation batch completed"
    );

    Ok(Json(CancelQueuedResponse {
        success: true,
        message: report.message,
        success_count: report.success_count,
        error_count: report.error_count,
        total_processed: report.total_processed,
        results: report.results,
    }))
}
