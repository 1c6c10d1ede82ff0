//! Trait for provider API implementations.

use async_trait::async_trait;

use crate::error::VercelResult;
use crate::types::{Deployment, EnvRecord, Project};

/// Operations the control plane needs from the hosting provider.
///
/// Implementations are expected to be cheap to clone behind an `Arc` and
/// safe to call concurrently. None of the operations retry; a failure is
/// surfaced to the caller, which owns the continue-or-abort decision.
#[async_trait]
pub trait VercelApi: Send + Sync {
    /// Create a project with the given name.
    async fn create_project(&self, name: &str) -> VercelResult<Project>;

    /// Look up a project by identifier.
    ///
    /// Returns `None` if the project does not exist.
    async fn get_project(&self, project_id: &str) -> VercelResult<Option<Project>>;

    /// Delete a project.
    async fn delete_project(&self, project_id: &str) -> VercelResult<()>;

    /// Create or update an environment variable on a project.
    async fn upsert_env(&self, project_id: &str, key: &str, value: &str)
        -> VercelResult<EnvRecord>;

    /// Delete an environment variable from a project.
    async fn delete_env(&self, project_id: &str, env_id: &str) -> VercelResult<()>;

    /// Look up a deployment by identifier.
    ///
    /// Returns `None` if the deployment does not exist.
    async fn get_deployment(&self, deployment_id: &str) -> VercelResult<Option<Deployment>>;

    /// Cancel (delete) a deployment.
    ///
    /// Returns the deployment with the state the provider reported after
    /// the operation.
    async fn cancel_deployment(&self, deployment_id: &str) -> VercelResult<Deployment>;
}
