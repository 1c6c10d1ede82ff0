//! Tenant management endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ControlError;
use crate::types::{Tenant, TenantId};

use super::{error_response, AppState, ErrorResponse};

/// Request to create a new tenant.
#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    /// Display name.
    pub name: String,
    /// URL-safe slug, used as the remote project name. Defaults to a
    /// lowercased version of the name.
    pub slug: Option<String>,
}

/// Response for creating a tenant.
#[derive(Debug, Serialize)]
pub struct CreateTenantResponse {
    /// The assigned tenant ID.
    pub id: String,
}

/// Create a new tenant.
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(request): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<CreateTenantResponse>), (StatusCode, Json<ErrorResponse>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(error_response(&ControlError::config(
            "tenant name must not be empty",
        )));
    }

    let slug = match request.slug {
        Some(slug) => slug.trim().to_owned(),
        None => name.to_lowercase().replace(' ', "-"),
    };

    let tenant = Tenant::new(name, slug);
    let id = tenant.id.clone();

    info!(tenant = %id, name = %tenant.name, "creating tenant");

    match state.store.insert_tenant(&tenant).await {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(CreateTenantResponse { id: id.to_string() }),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// Get a tenant by ID.
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Tenant>, (StatusCode, Json<ErrorResponse>)> {
    let tenant_id = TenantId::new(&id);

    match state.store.get_tenant(&tenant_id).await {
        Ok(Some(tenant)) => Ok(Json(tenant)),
        Ok(None) => Err(error_response(&ControlError::TenantNotFound(id))),
        Err(e) => Err(error_response(&e)),
    }
}

/// List all tenants.
pub async fn list_tenants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Tenant>>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.list_tenants().await {
        Ok(tenants) => Ok(Json(tenants)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Delete a tenant.
pub async fn delete_tenant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let tenant_id = TenantId::new(&id);

    info!(tenant = %id, "deleting tenant");

    match state.store.delete_tenant(&tenant_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(error_response(&e)),
    }
}
