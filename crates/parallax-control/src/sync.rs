//! Background reconciliation against the provider.
//!
//! The sync loop keeps local records consistent with remote project state:
//! tenants get their backing project created, environment variables are
//! pushed, and non-terminal deployment statuses are refreshed. Each pass
//! operates on data freshly fetched at its start; per-item failures are
//! logged and skipped so one bad record never stalls the rest.

use std::sync::Arc;
use std::time::Duration;

use parallax_vercel::VercelApi;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ControlResult;
use crate::store::{DeploymentFilter, PlatformStore};
use crate::types::{DeploymentStatus, Tenant};

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Remote projects created for tenants that had none.
    pub projects_created: usize,
    /// Environment variables pushed to the provider.
    pub envs_pushed: usize,
    /// Deployment records whose status was refreshed.
    pub deployments_refreshed: usize,
}

/// Periodically reconciles local records with the provider.
pub struct SyncRunner {
    store: Arc<dyn PlatformStore>,
    provider: Arc<dyn VercelApi>,
    interval: Duration,
}

impl SyncRunner {
    /// Create a new sync runner.
    pub fn new(
        store: Arc<dyn PlatformStore>,
        provider: Arc<dyn VercelApi>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            interval,
        }
    }

    /// Run reconciliation passes until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "sync loop started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("sync loop stopping");
                    break;
                }
                () = tokio::time::sleep(self.interval) => {
                    match self.run_once().await {
                        Ok(summary) => {
                            if summary != SyncSummary::default() {
                                info!(
                                    projects = summary.projects_created,
                                    envs = summary.envs_pushed,
                                    deployments = summary.deployments_refreshed,
                                    "sync pass completed"
                                );
                            }
                        }
                        Err(e) => warn!(error = %e, "sync pass failed"),
                    }
                }
            }
        }
    }

    /// Perform one reconciliation pass.
    pub async fn run_once(&self) -> ControlResult<SyncSummary> {
        let mut summary = SyncSummary::default();

        let tenants = self.store.list_tenants().await?;

        for tenant in &tenants {
            match &tenant.project_id {
                None => {
                    if self.provision_project(tenant).await {
                        summary.projects_created += 1;
                    }
                }
                Some(project_id) => {
                    summary.envs_pushed += self.push_env_variables(tenant, project_id).await;
                }
            }
        }

        summary.deployments_refreshed += self.refresh_deployments().await?;

        Ok(summary)
    }

    /// Create the remote project backing a tenant. Returns whether the
    /// project was created and recorded.
    async fn provision_project(&self, tenant: &Tenant) -> bool {
        let project = match self.provider.create_project(&tenant.slug).await {
            Ok(project) => project,
            Err(e) => {
                warn!(tenant = %tenant.id, error = %e, "failed to create remote project");
                return false;
            }
        };

        if let Err(e) = self.store.set_tenant_project(&tenant.id, &project.id).await {
            warn!(tenant = %tenant.id, error = %e, "failed to record remote project");
            return false;
        }

        info!(tenant = %tenant.id, project_id = %project.id, "remote project created");
        true
    }

    /// Push env variables that have not reached the provider yet. Returns
    /// the number pushed.
    async fn push_env_variables(&self, tenant: &Tenant, project_id: &str) -> usize {
        let variables = match self.store.list_env_variables(&tenant.id).await {
            Ok(variables) => variables,
            Err(e) => {
                warn!(tenant = %tenant.id, error = %e, "failed to list env variables");
                return 0;
            }
        };

        let mut pushed = 0;
        for variable in variables.iter().filter(|v| v.remote_id.is_none()) {
            let record = match self
                .provider
                .upsert_env(project_id, &variable.key, &variable.value)
                .await
            {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        tenant = %tenant.id,
                        key = %variable.key,
                        error = %e,
                        "failed to push env variable"
                    );
                    continue;
                }
            };

            if let Err(e) = self.store.mark_env_pushed(&variable.id, &record.id).await {
                warn!(key = %variable.key, error = %e, "failed to mark env variable pushed");
                continue;
            }

            debug!(tenant = %tenant.id, key = %variable.key, "env variable pushed");
            pushed += 1;
        }

        pushed
    }

    /// Refresh the status of non-terminal deployments with a remote
    /// identifier. Returns the number of records whose status changed.
    async fn refresh_deployments(&self) -> ControlResult<usize> {
        let mut refreshed = 0;

        for status in [DeploymentStatus::Queued, DeploymentStatus::Building] {
            let records = self
                .store
                .list_deployments(&DeploymentFilter::new().with_status(status))
                .await?;

            for record in records {
                let Some(remote_id) = record.deployment_id.as_deref() else {
                    continue;
                };

                let remote = match self.provider.get_deployment(remote_id).await {
                    Ok(Some(remote)) => remote,
                    Ok(None) => {
                        debug!(deployment_id = %remote_id, "deployment unknown to provider");
                        continue;
                    }
                    Err(e) => {
                        warn!(deployment_id = %remote_id, error = %e, "failed to fetch deployment");
                        continue;
                    }
                };

                let new_status = DeploymentStatus::from_remote(remote.state);
                if new_status == record.status && remote.url == record.url {
                    continue;
                }

                if let Err(e) = self
                    .store
                    .update_deployment_status(&record.id, new_status, remote.url.as_deref())
                    .await
                {
                    warn!(deployment_id = %remote_id, error = %e, "failed to update status");
                    continue;
                }

                debug!(
                    deployment_id = %remote_id,
                    status = %new_status,
                    "deployment status refreshed"
                );
                refreshed += 1;
            }
        }

        Ok(refreshed)
    }
}

impl std::fmt::Debug for SyncRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRunner").finish_non_exhaustive()
    }
}
