//! Platform settings endpoints.
//!
//! The settings record carries provider credentials. Every write passes
//! through credential normalization, so what gets persisted (and echoed
//! back) always has at most one active entry.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;

use crate::credentials::normalize_credentials;
use crate::types::PlatformSettings;

use super::{error_response, AppState, ErrorResponse};

/// Request to update the platform settings.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    /// Raw credential list. Anything other than an array (including a
    /// missing field) leaves the stored list in place, re-normalized.
    pub credentials: Option<serde_json::Value>,
}

/// Get the platform settings.
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<PlatformSettings>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get_settings().await {
        Ok(settings) => Ok(Json(settings)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Update the platform settings.
///
/// The incoming credential list is normalized before persisting; the
/// response body is the record as stored.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<PlatformSettings>, (StatusCode, Json<ErrorResponse>)> {
    let previous = match state.store.get_settings().await {
        Ok(settings) => settings,
        Err(e) => return Err(error_response(&e)),
    };

    let credentials = normalize_credentials(
        request.credentials.as_ref(),
        &previous.credentials,
        state.env_credential.as_ref(),
    );

    let settings = PlatformSettings { credentials };

    info!(
        credentials = settings.credentials.len(),
        "updating platform settings"
    );

    match state.store.put_settings(&settings).await {
        Ok(()) => Ok(Json(settings)),
        Err(e) => Err(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::make_app_state;
    use crate::store::PlatformStore;
    use super::*;
    use crate::credentials::EnvCredential;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_settings_defaults_to_empty() {
        let (state, _store, _provider) = make_app_state();
        let app = super::super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/settings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["credentials"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn update_normalizes_credentials() {
        let (state, store, _provider) = make_app_state();
        let app = super::super::router(state);

        // Two entries flagged active; the later one must win. The
        // malformed entry is discarded.
        let body = r#"{
            "credentials": [
                {"accountName": "A", "vercelToken": "tok_a", "active": true},
                "garbage",
                {"accountName": "B", "vercelToken": "tok_b", "active": true}
            ]
        }"#;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/settings")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let credentials = body["credentials"].as_array().unwrap();
        assert_eq!(credentials.len(), 2);
        assert_eq!(credentials[0]["active"], false);
        assert_eq!(credentials[1]["active"], true);
        assert_eq!(credentials[1]["accountName"], "B");

        let stored = store.get_settings().await.unwrap();
        assert_eq!(stored.credentials.len(), 2);
        assert!(stored.credentials[1].active);
    }

    #[tokio::test]
    async fn update_without_credentials_keeps_previous() {
        let (state, store, _provider) = make_app_state();
        let app = super::super::router(state);

        let initial = r#"{"credentials": [{"accountName": "A", "vercelToken": "tok_a", "active": true}]}"#;
        app.clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/settings")
                    .header("content-type", "application/json")
                    .body(Body::from(initial))
                    .unwrap(),
            )
            .await
            .unwrap();

        // A write with no credentials field re-normalizes the stored list.
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/settings")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let stored = store.get_settings().await.unwrap();
        assert_eq!(stored.credentials.len(), 1);
        assert_eq!(stored.credentials[0].account_name, "A");
    }

    #[tokio::test]
    async fn empty_list_seeds_env_fallback() {
        let (mut state, store, _provider) = make_app_state();
        state.env_credential = EnvCredential::from_values(Some("tok_env"), Some("team_env"));
        let app = super::super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/settings")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"credentials": []}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let stored = store.get_settings().await.unwrap();
        assert_eq!(stored.credentials.len(), 1);
        assert_eq!(stored.credentials[0].account_name, "Environment");
        assert!(stored.credentials[0].active);
    }
}
