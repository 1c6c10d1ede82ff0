//! In-memory store for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{ControlError, ControlResult};
use crate::types::{
    DeploymentRecord, DeploymentStatus, EnvVariable, PlatformSettings, RecordId, Tenant, TenantId,
};

use super::{DeploymentFilter, PlatformStore};

/// In-memory store for testing.
///
/// This implementation is not suitable for production use as data is lost
/// when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<String, Tenant>>,
    env_variables: RwLock<HashMap<String, EnvVariable>>,
    deployments: RwLock<HashMap<String, DeploymentRecord>>,
    settings: RwLock<PlatformSettings>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformStore for MemoryStore {
    async fn insert_tenant(&self, tenant: &Tenant) -> ControlResult<()> {
        let mut tenants = self
            .tenants
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let key = tenant.id.as_str().to_owned();
        if tenants.contains_key(&key) {
            return Err(ControlError::internal(format!(
                "tenant {key} already exists"
            )));
        }

        tenants.insert(key, tenant.clone());
        Ok(())
    }

    async fn get_tenant(&self, id: &TenantId) -> ControlResult<Option<Tenant>> {
        let tenants = self
            .tenants
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        Ok(tenants.get(id.as_str()).cloned())
    }

    async fn list_tenants(&self) -> ControlResult<Vec<Tenant>> {
        let tenants = self
            .tenants
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let mut results: Vec<_> = tenants.values().cloned().collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn set_tenant_project(&self, id: &TenantId, project_id: &str) -> ControlResult<()> {
        let mut tenants = self
            .tenants
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let tenant = tenants
            .get_mut(id.as_str())
            .ok_or_else(|| ControlError::TenantNotFound(id.to_string()))?;

        tenant.project_id = Some(project_id.to_owned());
        tenant.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn delete_tenant(&self, id: &TenantId) -> ControlResult<()> {
        let mut tenants = self
            .tenants
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        if tenants.remove(id.as_str()).is_none() {
            return Err(ControlError::TenantNotFound(id.to_string()));
        }

        let mut env_variables = self
            .env_variables
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;
        env_variables.retain(|_, v| v.tenant_id != *id);

        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;
        for record in deployments.values_mut() {
            if record.tenant_id.as_ref() == Some(id) {
                record.tenant_id = None;
                record.updated_at = chrono::Utc::now();
            }
        }

        Ok(())
    }

    async fn insert_env_variable(&self, variable: &EnvVariable) -> ControlResult<()> {
        let mut env_variables = self
            .env_variables
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let key = variable.id.as_str().to_owned();
        if env_variables.contains_key(&key) {
            return Err(ControlError::internal(format!(
                "environment variable {key} already exists"
            )));
        }

        env_variables.insert(key, variable.clone());
        Ok(())
    }

    async fn list_env_variables(&self, tenant_id: &TenantId) -> ControlResult<Vec<EnvVariable>> {
        let env_variables = self
            .env_variables
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let mut results: Vec<_> = env_variables
            .values()
            .filter(|v| v.tenant_id == *tenant_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(results)
    }

    async fn mark_env_pushed(&self, id: &RecordId, remote_id: &str) -> ControlResult<()> {
        let mut env_variables = self
            .env_variables
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let variable = env_variables
            .get_mut(id.as_str())
            .ok_or_else(|| ControlError::EnvVariableNotFound(id.to_string()))?;

        variable.remote_id = Some(remote_id.to_owned());
        variable.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn delete_env_variable(&self, id: &RecordId) -> ControlResult<()> {
        let mut env_variables = self
            .env_variables
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        if env_variables.remove(id.as_str()).is_none() {
            return Err(ControlError::EnvVariableNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn insert_deployment(&self, record: &DeploymentRecord) -> ControlResult<()> {
        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let key = record.id.as_str().to_owned();
        if deployments.contains_key(&key) {
            return Err(ControlError::internal(format!(
                "deployment {key} already exists"
            )));
        }

        deployments.insert(key, record.clone());
        Ok(())
    }

    async fn get_deployment(&self, id: &RecordId) -> ControlResult<Option<DeploymentRecord>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        Ok(deployments.get(id.as_str()).cloned())
    }

    async fn list_deployments(
        &self,
        filter: &DeploymentFilter,
    ) -> ControlResult<Vec<DeploymentRecord>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let mut results: Vec<_> = deployments
            .values()
            .filter(|r| {
                if let Some(ref tenant_id) = filter.tenant_id {
                    if r.tenant_id.as_ref() != Some(tenant_id) {
                        return false;
                    }
                }
                if let Some(status) = filter.status {
                    if r.status != status {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        #[allow(clippy::as_conversions)]
        let offset = filter.offset.unwrap_or(0) as usize;
        let results: Vec<_> = results.into_iter().skip(offset).collect();

        if let Some(limit) = filter.limit {
            #[allow(clippy::as_conversions)]
            Ok(results.into_iter().take(limit as usize).collect())
        } else {
            Ok(results)
        }
    }

    async fn update_deployment_status(
        &self,
        id: &RecordId,
        status: DeploymentStatus,
        url: Option<&str>,
    ) -> ControlResult<()> {
        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        let record = deployments
            .get_mut(id.as_str())
            .ok_or_else(|| ControlError::DeploymentNotFound(id.to_string()))?;

        record.status = status;
        if let Some(url) = url {
            record.url = Some(url.to_owned());
        }
        record.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn delete_deployment(&self, id: &RecordId) -> ControlResult<()> {
        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        if deployments.remove(id.as_str()).is_none() {
            return Err(ControlError::DeploymentNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn get_settings(&self) -> ControlResult<PlatformSettings> {
        let settings = self
            .settings
            .read()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        Ok(settings.clone())
    }

    async fn put_settings(&self, settings: &PlatformSettings) -> ControlResult<()> {
        let mut stored = self
            .settings
            .write()
            .map_err(|_| ControlError::internal("lock poisoned"))?;

        *stored = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Credential;

    fn test_tenant() -> Tenant {
        Tenant::new("Acme Corp", "acme-corp")
    }

    #[tokio::test]
    async fn tenant_insert_and_get() {
        let store = MemoryStore::new();

        let tenant = test_tenant();
        let id = tenant.id.clone();

        store.insert_tenant(&tenant).await.expect("insert failed");

        let retrieved = store
            .get_tenant(&id)
            .await
            .expect("get failed")
            .expect("tenant not found");

        assert_eq!(retrieved.id, id);
        assert_eq!(retrieved.name, "Acme Corp");
        assert!(retrieved.project_id.is_none());
    }

    #[tokio::test]
    async fn duplicate_tenant_insert_fails() {
        let store = MemoryStore::new();

        let tenant = test_tenant();
        store.insert_tenant(&tenant).await.expect("insert failed");
        assert!(store.insert_tenant(&tenant).await.is_err());
    }

    #[tokio::test]
    async fn set_tenant_project() {
        let store = MemoryStore::new();

        let tenant = test_tenant();
        let id = tenant.id.clone();
        store.insert_tenant(&tenant).await.expect("insert failed");

        store
            .set_tenant_project(&id, "prj_123")
            .await
            .expect("update failed");

        let retrieved = store
            .get_tenant(&id)
            .await
            .expect("get failed")
            .expect("not found");
        assert_eq!(retrieved.project_id.as_deref(), Some("prj_123"));
    }

    #[tokio::test]
    async fn delete_tenant_cascades_and_detaches() {
        let store = MemoryStore::new();

        let tenant = test_tenant();
        let tenant_id = tenant.id.clone();
        store.insert_tenant(&tenant).await.expect("insert failed");

        let variable = EnvVariable::new(tenant_id.clone(), "API_KEY", "secret");
        store
            .insert_env_variable(&variable)
            .await
            .expect("insert failed");

        let deployment = DeploymentRecord::new(
            Some(tenant_id.clone()),
            Some("dpl_1".to_owned()),
            None,
        );
        let deployment_id = deployment.id.clone();
        store
            .insert_deployment(&deployment)
            .await
            .expect("insert failed");

        store.delete_tenant(&tenant_id).await.expect("delete failed");

        assert!(store
            .list_env_variables(&tenant_id)
            .await
            .expect("list failed")
            .is_empty());

        let retained = store
            .get_deployment(&deployment_id)
            .await
            .expect("get failed")
            .expect("deployment should survive tenant deletion");
        assert!(retained.tenant_id.is_none());
    }

    #[tokio::test]
    async fn env_variable_lifecycle() {
        let store = MemoryStore::new();

        let tenant = test_tenant();
        let tenant_id = tenant.id.clone();
        store.insert_tenant(&tenant).await.expect("insert failed");

        let variable = EnvVariable::new(tenant_id.clone(), "B_KEY", "b");
        let first_id = variable.id.clone();
        store
            .insert_env_variable(&variable)
            .await
            .expect("insert failed");
        store
            .insert_env_variable(&EnvVariable::new(tenant_id.clone(), "A_KEY", "a"))
            .await
            .expect("insert failed");

        let listed = store
            .list_env_variables(&tenant_id)
            .await
            .expect("list failed");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "A_KEY");

        store
            .mark_env_pushed(&first_id, "env_remote_1")
            .await
            .expect("mark failed");
        let listed = store
            .list_env_variables(&tenant_id)
            .await
            .expect("list failed");
        assert_eq!(
            listed.iter().find(|v| v.id == first_id).unwrap().remote_id.as_deref(),
            Some("env_remote_1")
        );

        store
            .delete_env_variable(&first_id)
            .await
            .expect("delete failed");
        assert!(store.delete_env_variable(&first_id).await.is_err());
    }

    #[tokio::test]
    async fn deployment_filters() {
        let store = MemoryStore::new();

        let tenant = test_tenant();
        let tenant_id = tenant.id.clone();
        store.insert_tenant(&tenant).await.expect("insert failed");

        let queued = DeploymentRecord::new(Some(tenant_id.clone()), Some("dpl_1".to_owned()), None);
        store.insert_deployment(&queued).await.expect("insert failed");

        let mut ready = DeploymentRecord::new(Some(tenant_id.clone()), Some("dpl_2".to_owned()), None);
        ready.status = DeploymentStatus::Ready;
        store.insert_deployment(&ready).await.expect("insert failed");

        let orphan = DeploymentRecord::new(None, None, None);
        store.insert_deployment(&orphan).await.expect("insert failed");

        let all = store
            .list_deployments(&DeploymentFilter::new())
            .await
            .expect("list failed");
        assert_eq!(all.len(), 3);

        let queued_only = store
            .list_deployments(&DeploymentFilter::new().with_status(DeploymentStatus::Queued))
            .await
            .expect("list failed");
        assert_eq!(queued_only.len(), 2);

        let tenant_queued = store
            .list_deployments(
                &DeploymentFilter::new()
                    .with_tenant(tenant_id.clone())
                    .with_status(DeploymentStatus::Queued),
            )
            .await
            .expect("list failed");
        assert_eq!(tenant_queued.len(), 1);
        assert_eq!(tenant_queued[0].id, queued.id);
    }

    #[tokio::test]
    async fn deployment_pagination() {
        let store = MemoryStore::new();

        for _ in 0..5 {
            let record = DeploymentRecord::new(None, None, None);
            store.insert_deployment(&record).await.expect("insert failed");
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let page1 = store
            .list_deployments(&DeploymentFilter::new().with_limit(2))
            .await
            .expect("list failed");
        assert_eq!(page1.len(), 2);

        let page2 = store
            .list_deployments(&DeploymentFilter::new().with_limit(2).with_offset(2))
            .await
            .expect("list failed");
        assert_eq!(page2.len(), 2);

        assert_ne!(page1[0].id, page2[0].id);
    }

    #[tokio::test]
    async fn deployment_status_update() {
        let store = MemoryStore::new();

        let record = DeploymentRecord::new(None, Some("dpl_1".to_owned()), None);
        let id = record.id.clone();
        store.insert_deployment(&record).await.expect("insert failed");

        store
            .update_deployment_status(&id, DeploymentStatus::Ready, Some("acme.vercel.app"))
            .await
            .expect("update failed");

        let retrieved = store
            .get_deployment(&id)
            .await
            .expect("get failed")
            .expect("not found");
        assert_eq!(retrieved.status, DeploymentStatus::Ready);
        assert_eq!(retrieved.url.as_deref(), Some("acme.vercel.app"));
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let store = MemoryStore::new();

        let initial = store.get_settings().await.expect("get failed");
        assert!(initial.credentials.is_empty());

        let settings = PlatformSettings {
            credentials: vec![Credential {
                account_name: "Acme".to_owned(),
                vercel_token: "tok".to_owned(),
                vercel_team_id: None,
                active: true,
            }],
        };
        store.put_settings(&settings).await.expect("put failed");

        let stored = store.get_settings().await.expect("get failed");
        assert_eq!(stored.credentials.len(), 1);
        assert!(stored.credentials[0].active);
    }
}
