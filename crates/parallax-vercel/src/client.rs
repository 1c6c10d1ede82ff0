//! HTTP client for the Vercel REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::error::{VercelError, VercelResult};
use crate::traits::VercelApi;
use crate::types::{Deployment, EnvRecord, Project};

/// Default base URL for the provider API.
const DEFAULT_API_URL: &str = "https://api.vercel.com";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Error body shape returned by the provider.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Response wrapper for single-variable env upserts.
#[derive(Deserialize)]
struct UpsertEnvResponse {
    created: EnvRecord,
}

/// HTTP client for interacting with the hosting provider.
#[derive(Debug, Clone)]
pub struct VercelClient {
    client: Client,
    base_url: String,
    token: String,
    team_id: Option<String>,
}

impl VercelClient {
    /// Create a new client with the given API token.
    pub fn new(token: impl Into<String>) -> VercelResult<Self> {
        Self::builder(token, DEFAULT_API_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new client with a custom base URL and timeout.
    pub fn with_options(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> VercelResult<Self> {
        Self::builder(token, base_url, timeout)
    }

    fn builder(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> VercelResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(VercelError::Config("API token must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(VercelError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
            team_id: None,
        })
    }

    /// Scope all requests to a team.
    #[must_use]
    pub fn with_team_id(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Attach auth and the optional team scope to a request.
    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.bearer_auth(&self.token);
        match &self.team_id {
            Some(team_id) => request.query(&[("teamId", team_id.as_str())]),
            None => request,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-success response into an API error with the provider's
    /// message when one is present.
    async fn api_error(response: Response) -> VercelError {
        let status = response.status().as_u16();
        match response.json::<ApiErrorBody>().await {
            Ok(body) => VercelError::api(status, body.error.message),
            Err(_) => VercelError::api(status, "unrecognised error response"),
        }
    }
}

#[async_trait]
impl VercelApi for VercelClient {
    async fn create_project(&self, name: &str) -> VercelResult<Project> {
        let url = self.url("/v10/projects");
        let response = self
            .prepare(self.client.post(&url))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(VercelError::Http)?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response.json().await.map_err(VercelError::Http)
    }

    async fn get_project(&self, project_id: &str) -> VercelResult<Option<Project>> {
        let url = self.url(&format!("/v9/projects/{project_id}"));
        let response = self
            .prepare(self.client.get(&url))
            .send()
            .await
            .map_err(VercelError::Http)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json().await.map(Some).map_err(VercelError::Http)
            }
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn delete_project(&self, project_id: &str) -> VercelResult<()> {
        let url = self.url(&format!("/v9/projects/{project_id}"));
        let response = self
            .prepare(self.client.delete(&url))
            .send()
            .await
            .map_err(VercelError::Http)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(VercelError::not_found(format!("project {project_id}"))),
            status if status.is_success() => Ok(()),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn upsert_env(
        &self,
        project_id: &str,
        key: &str,
        value: &str,
    ) -> VercelResult<EnvRecord> {
        let url = self.url(&format!("/v10/projects/{project_id}/env"));
        let response = self
            .prepare(self.client.post(&url))
            .query(&[("upsert", "true")])
            .json(&serde_json::json!({
                "key": key,
                "value": value,
                "type": "encrypted",
                "target": ["production", "preview", "development"],
            }))
            .send()
            .await
            .map_err(VercelError::Http)?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: UpsertEnvResponse = response.json().await.map_err(VercelError::Http)?;
        Ok(body.created)
    }

    async fn delete_env(&self, project_id: &str, env_id: &str) -> VercelResult<()> {
        let url = self.url(&format!("/v9/projects/{project_id}/env/{env_id}"));
        let response = self
            .prepare(self.client.delete(&url))
            .send()
            .await
            .map_err(VercelError::Http)?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                Err(VercelError::not_found(format!("env record {env_id}")))
            }
            status if status.is_success() => Ok(()),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn get_deployment(&self, deployment_id: &str) -> VercelResult<Option<Deployment>> {
        let url = self.url(&format!("/v13/deployments/{deployment_id}"));
        let response = self
            .prepare(self.client.get(&url))
            .send()
            .await
            .map_err(VercelError::Http)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json().await.map(Some).map_err(VercelError::Http)
            }
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn cancel_deployment(&self, deployment_id: &str) -> VercelResult<Deployment> {
        let url = self.url(&format!("/v13/deployments/{deployment_id}"));
        let response = self
            .prepare(self.client.delete(&url))
            .send()
            .await
            .map_err(VercelError::Http)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(VercelError::not_found(format!(
                "deployment {deployment_id}"
            ))),
            status if status.is_success() => response.json().await.map_err(VercelError::Http),
            _ => Err(Self::api_error(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = VercelClient::new("tok_test");
        assert!(client.is_ok());
    }

    #[test]
    fn empty_token_rejected() {
        assert!(VercelClient::new("   ").is_err());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = VercelClient::with_options(
            "tok_test",
            "http://localhost:9999/",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.url("/v9/projects/p1"), "http://localhost:9999/v9/projects/p1");
    }
}
