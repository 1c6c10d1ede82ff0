//! Tenant environment variable endpoints.
//!
//! Variables are recorded locally and pushed to the provider by the sync
//! loop; these handlers only touch the local records.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ControlError;
use crate::types::{EnvVariable, RecordId, TenantId};

use super::{error_response, AppState, ErrorResponse};

/// Request to create an environment variable.
#[derive(Debug, Deserialize)]
pub struct CreateEnvVariableRequest {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
}

/// Response for creating an environment variable.
#[derive(Debug, Serialize)]
pub struct CreateEnvVariableResponse {
    /// The assigned record ID.
    pub id: String,
}

/// Create an environment variable for a tenant.
pub async fn create_env_variable(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(request): Json<CreateEnvVariableRequest>,
) -> Result<(StatusCode, Json<CreateEnvVariableResponse>), (StatusCode, Json<ErrorResponse>)> {
    let key = request.key.trim();
    if key.is_empty() {
        return Err(error_response(&ControlError::config(
            "variable key must not be empty",
        )));
    }

    let tenant_id = TenantId::new(&tenant_id);
    match state.store.get_tenant(&tenant_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(error_response(&ControlError::TenantNotFound(
                tenant_id.to_string(),
            )))
        }
        Err(e) => return Err(error_response(&e)),
    }

    let variable = EnvVariable::new(tenant_id.clone(), key, request.value);
    let id = variable.id.clone();

    info!(tenant = %tenant_id, key = %variable.key, "creating env variable");

    match state.store.insert_env_variable(&variable).await {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(CreateEnvVariableResponse { id: id.to_string() }),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// List a tenant's environment variables.
pub async fn list_env_variables(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Vec<EnvVariable>>, (StatusCode, Json<ErrorResponse>)> {
    let tenant_id = TenantId::new(&tenant_id);

    match state.store.list_env_variables(&tenant_id).await {
        Ok(variables) => Ok(Json(variables)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Delete an environment variable.
pub async fn delete_env_variable(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let record_id = RecordId::new(&id);

    info!(env_variable = %id, "deleting env variable");

    match state.store.delete_env_variable(&record_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::make_app_state;
    use crate::store::PlatformStore;
    use super::*;
    use crate::types::Tenant;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn create_and_list_env_variables() {
        let (state, store, _provider) = make_app_state();
        let app = super::super::router(state);

        let tenant = Tenant::new("Acme", "acme");
        let tenant_id = tenant.id.clone();
        store.insert_tenant(&tenant).await.unwrap();

        let uri = format!("/tenants/{tenant_id}/envariables");
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(&uri)
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"API_KEY","value":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let variables = store.list_env_variables(&tenant_id).await.unwrap();
        assert_eq!(variables.len(), 1);
        assert_eq!(variables[0].key, "API_KEY");

        let response = app
            .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_for_missing_tenant_rejected() {
        let (state, _store, _provider) = make_app_state();
        let app = super::super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tenants/nonexistent/envariables")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"API_KEY","value":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_key_rejected() {
        let (state, store, _provider) = make_app_state();
        let app = super::super::router(state);

        let tenant = Tenant::new("Acme", "acme");
        let tenant_id = tenant.id.clone();
        store.insert_tenant(&tenant).await.unwrap();

        let uri = format!("/tenants/{tenant_id}/envariables");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(&uri)
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"  ","value":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_env_variable_by_id() {
        let (state, store, _provider) = make_app_state();
        let app = super::super::router(state);

        let tenant = Tenant::new("Acme", "acme");
        let tenant_id = tenant.id.clone();
        store.insert_tenant(&tenant).await.unwrap();

        let variable = EnvVariable::new(tenant_id.clone(), "API_KEY", "secret");
        let variable_id = variable.id.clone();
        store.insert_env_variable(&variable).await.unwrap();

        let uri = format!("/envariables/{variable_id}");
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(&uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.list_env_variables(&tenant_id).await.unwrap().is_empty());
    }
}
