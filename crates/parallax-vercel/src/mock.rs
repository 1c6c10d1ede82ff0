//! In-memory provider implementation for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{VercelError, VercelResult};
use crate::traits::VercelApi;
use crate::types::{Deployment, DeploymentState, EnvRecord, Project};

/// In-memory mock of the provider API.
///
/// State is process-local and lost on drop. Individual deployment
/// cancellations can be made to fail via [`MockVercel::fail_cancel`],
/// which is how error paths in batch processing are exercised.
#[derive(Debug, Default)]
pub struct MockVercel {
    projects: RwLock<HashMap<String, Project>>,
    envs: RwLock<HashMap<String, Vec<EnvRecord>>>,
    deployments: RwLock<HashMap<String, Deployment>>,
    failing_cancels: RwLock<HashSet<String>>,
    counter: AtomicU64,
}

impl MockVercel {
    /// Create a new empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}_{n:06}")
    }

    /// Seed a deployment in the given state.
    pub fn add_deployment(&self, id: impl Into<String>, state: DeploymentState) {
        let id = id.into();
        let deployment = Deployment {
            id: id.clone(),
            url: None,
            state,
        };
        if let Ok(mut deployments) = self.deployments.write() {
            deployments.insert(id, deployment);
        }
    }

    /// Make future cancellations of the given deployment fail.
    pub fn fail_cancel(&self, id: impl Into<String>) {
        if let Ok(mut failing) = self.failing_cancels.write() {
            failing.insert(id.into());
        }
    }

    fn lock_poisoned() -> VercelError {
        VercelError::Config("lock poisoned".into())
    }
}

#[async_trait]
impl VercelApi for MockVercel {
    async fn create_project(&self, name: &str) -> VercelResult<Project> {
        let project = Project {
            id: self.next_id("prj"),
            name: name.to_owned(),
        };

        let mut projects = self.projects.write().map_err(|_| Self::lock_poisoned())?;
        projects.insert(project.id.clone(), project.clone());

        Ok(project)
    }

    async fn get_project(&self, project_id: &str) -> VercelResult<Option<Project>> {
        let projects = self.projects.read().map_err(|_| Self::lock_poisoned())?;
        Ok(projects.get(project_id).cloned())
    }

    async fn delete_project(&self, project_id: &str) -> VercelResult<()> {
        let mut projects = self.projects.write().map_err(|_| Self::lock_poisoned())?;
        if projects.remove(project_id).is_none() {
            return Err(VercelError::not_found(format!("project {project_id}")));
        }

        let mut envs = self.envs.write().map_err(|_| Self::lock_poisoned())?;
        envs.remove(project_id);

        Ok(())
    }

    async fn upsert_env(
        &self,
        project_id: &str,
        key: &str,
        value: &str,
    ) -> VercelResult<EnvRecord> {
        let record = EnvRecord {
            id: self.next_id("env"),
            key: key.to_owned(),
            value: value.to_owned(),
        };

        let mut envs = self.envs.write().map_err(|_| Self::lock_poisoned())?;
        let project_envs = envs.entry(project_id.to_owned()).or_default();

        if let Some(existing) = project_envs.iter_mut().find(|e| e.key == key) {
            existing.value = value.to_owned();
            return Ok(existing.clone());
        }

        project_envs.push(record.clone());
        Ok(record)
    }

    async fn delete_env(&self, project_id: &str, env_id: &str) -> VercelResult<()> {
        let mut envs = self.envs.write().map_err(|_| Self::lock_poisoned())?;
        let project_envs = envs
            .get_mut(project_id)
            .ok_or_else(|| VercelError::not_found(format!("project {project_id}")))?;

        let before = project_envs.len();
        project_envs.retain(|e| e.id != env_id);
        if project_envs.len() == before {
            return Err(VercelError::not_found(format!("env record {env_id}")));
        }

        Ok(())
    }

    async fn get_deployment(&self, deployment_id: &str) -> VercelResult<Option<Deployment>> {
        let deployments = self.deployments.read().map_err(|_| Self::lock_poisoned())?;
        Ok(deployments.get(deployment_id).cloned())
    }

    async fn cancel_deployment(&self, deployment_id: &str) -> VercelResult<Deployment> {
        {
            let failing = self
                .failing_cancels
                .read()
                .map_err(|_| Self::lock_poisoned())?;
            if failing.contains(deployment_id) {
                return Err(VercelError::api(500, "injected cancellation failure"));
            }
        }

        let mut deployments = self.deployments.write().map_err(|_| Self::lock_poisoned())?;
        let deployment = deployments
            .get_mut(deployment_id)
            .ok_or_else(|| VercelError::not_found(format!("deployment {deployment_id}")))?;

        deployment.state = DeploymentState::Canceled;
        Ok(deployment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn project_lifecycle() {
        let mock = MockVercel::new();

        let project = mock.create_project("acme").await.unwrap();
        assert_eq!(project.name, "acme");

        let found = mock.get_project(&project.id).await.unwrap();
        assert!(found.is_some());

        mock.delete_project(&project.id).await.unwrap();
        assert!(mock.get_project(&project.id).await.unwrap().is_none());
        assert!(mock.delete_project(&project.id).await.is_err());
    }

    #[tokio::test]
    async fn env_upsert_updates_existing_key() {
        let mock = MockVercel::new();
        let project = mock.create_project("acme").await.unwrap();

        let first = mock.upsert_env(&project.id, "API_KEY", "one").await.unwrap();
        let second = mock.upsert_env(&project.id, "API_KEY", "two").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value, "two");

        mock.delete_env(&project.id, &first.id).await.unwrap();
        assert!(mock.delete_env(&project.id, &first.id).await.is_err());
    }

    #[tokio::test]
    async fn cancel_marks_deployment_canceled() {
        let mock = MockVercel::new();
        mock.add_deployment("dpl_1", DeploymentState::Queued);

        let cancelled = mock.cancel_deployment("dpl_1").await.unwrap();
        assert_eq!(cancelled.state, DeploymentState::Canceled);
    }

    #[tokio::test]
    async fn cancel_failure_injection() {
        let mock = MockVercel::new();
        mock.add_deployment("dpl_1", DeploymentState::Queued);
        mock.fail_cancel("dpl_1");

        let result = mock.cancel_deployment("dpl_1").await;
        assert!(matches!(result, Err(VercelError::Api { status: 500, .. })));

        // Failure injection must not mutate the deployment.
        let deployment = mock.get_deployment("dpl_1").await.unwrap().unwrap();
        assert_eq!(deployment.state, DeploymentState::Queued);
    }

    #[tokio::test]
    async fn cancel_unknown_deployment_is_not_found() {
        let mock = MockVercel::new();
        assert!(matches!(
            mock.cancel_deployment("missing").await,
            Err(VercelError::NotFound(_))
        ));
    }
}
