//! Deployment record orchestration against the provider.

use std::sync::Arc;

use parallax_vercel::VercelApi;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ControlError, ControlResult};
use crate::store::{DeploymentFilter, PlatformStore};
use crate::types::{DeploymentRecord, DeploymentStatus, RecordId, TenantId};

/// Per-item outcome of a cancellation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelStatus {
    /// The item was processed and its local record deleted.
    Success,
    /// The remote call raised; the local record was preserved for retry.
    Error,
}

/// One entry in the cancellation batch report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelItem {
    /// Remote deployment identifier, or the local record ID when the
    /// record never reached the provider.
    pub deployment_id: String,
    /// Whether this item succeeded.
    pub status: CancelStatus,
    /// State the provider reported for the cancelled deployment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vercel_state: Option<String>,
    /// Error message for failed items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Annotation for items with no remote counterpart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Aggregate report for a cancellation batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReport {
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

/// Orchestrates deployment record operations: batch cancellation of queued
/// deployments and status refresh against the provider.
pub struct DeploymentManager {
    store: Arc<dyn PlatformStore>,
    provider: Arc<dyn VercelApi>,
}

impl DeploymentManager {
    /// Create a new deployment manager.
    pub fn new(store: Arc<dyn PlatformStore>, provider: Arc<dyn VercelApi>) -> Self {
        Self { store, provider }
    }

    /// Cancel all queued deployments, optionally limited to one tenant.
    ///
    /// Records are processed strictly sequentially over the snapshot
    /// fetched at the start; the batch runs to completion regardless of
    /// individual failures. For each record:
    ///
    /// - with a remote identifier: request remote cancellation, record the
    ///   provider's reported state, then delete the local record. If the
    ///   remote call raises, the local record is preserved for retry and
    ///   an error item is recorded.
    /// - without a remote identifier: delete only the local record and
    ///   annotate the item as local-only.
    ///
    /// Only the initial store query can fail this method; per-item
    /// failures are captured in the report.
    pub async fn cancel_queued(&self, tenant: Option<&TenantId>) -> ControlResult<CancelReport> {
        let mut filter = DeploymentFilter::new().with_status(DeploymentStatus::Queued);
        if let Some(tenant_id) = tenant {
            filter = filter.with_tenant(tenant_id.clone());
        }

        let records = self.store.list_deployments(&filter).await?;
        let total_processed = records.len();

        info!(
            total = total_processed,
            tenant = tenant.map(TenantId::as_str),
            "cancelling queued deployments"
        );

        let mut results = Vec::with_capacity(total_processed);
        let mut success_count = 0usize;
        let mut error_count = 0usize;

        for record in &records {
            let item = match &record.deployment_id {
                Some(remote_id) => self.cancel_one(record, remote_id).await,
                None => self.delete_local_only(record).await,
            };

            match item.status {
                CancelStatus::Success => success_count += 1,
                CancelStatus::Error => error_count += 1,
            }
            results.push(item);
        }

        let message = match tenant {
            Some(tenant_id) => format!(
                "Processed {total_processed} queued deployment(s) for tenant {tenant_id}: \
                 {success_count} cancelled, {error_count} failed"
            ),
            None => format!(
                "Processed {total_processed} queued deployment(s): \
                 {success_count} cancelled, {error_count} failed"
            ),
        };

        Ok(CancelReport {
            message,
            success_count,
            error_count,
            total_processed,
            results,
        })
    }

    async fn cancel_one(&self, record: &DeploymentRecord, remote_id: &str) -> CancelItem {
        let remote = match self.provider.cancel_deployment(remote_id).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(
                    deployment_id = %remote_id,
                    error = %e,
                    "remote cancellation failed, keeping local record"
                );
                return CancelItem {
                    deployment_id: remote_id.to_owned(),
                    status: CancelStatus::Error,
                    vercel_state: None,
                    error: Some(e.to_string()),
                    note: None,
                };
            }
        };

        if let Err(e) = self.store.delete_deployment(&record.id).await {
            warn!(
                deployment_id = %remote_id,
                error = %e,
                "failed to delete local record after remote cancellation"
            );
            return CancelItem {
                deployment_id: remote_id.to_owned(),
                status: CancelStatus::Error,
                vercel_state: Some(remote.state.to_string()),
                error: Some(e.to_string()),
                note: None,
            };
        }

        CancelItem {
            deployment_id: remote_id.to_owned(),
            status: CancelStatus::Success,
            vercel_state: Some(remote.state.to_string()),
            error: None,
            note: None,
        }
    }

    async fn delete_local_only(&self, record: &DeploymentRecord) -> CancelItem {
        match self.store.delete_deployment(&record.id).await {
            Ok(()) => CancelItem {
                deployment_id: record.id.to_string(),
                status: CancelStatus::Success,
                vercel_state: None,
                error: None,
                note: Some("local record only, no remote deployment to cancel".to_owned()),
            },
            Err(e) => CancelItem {
                deployment_id: record.id.to_string(),
                status: CancelStatus::Error,
                vercel_state: None,
                error: Some(e.to_string()),
                note: Some("local record only, no remote deployment to cancel".to_owned()),
            },
        }
    }

    /// Record a new local deployment.
    pub async fn record_deployment(&self, record: DeploymentRecord) -> ControlResult<RecordId> {
        self.store.insert_deployment(&record).await?;
        info!(
            record_id = %record.id,
            deployment_id = record.deployment_id.as_deref(),
            "deployment recorded"
        );
        Ok(record.id)
    }

    /// Refresh a deployment record's status from the provider.
    ///
    /// Returns the updated status, or the current one when the record has
    /// no remote identifier or the provider no longer knows the
    /// deployment.
    pub async fn refresh_status(&self, id: &RecordId) -> ControlResult<DeploymentStatus> {
        let record = self
            .store
            .get_deployment(id)
            .await?
            .ok_or_else(|| ControlError::DeploymentNotFound(id.to_string()))?;

        let Some(remote_id) = record.deployment_id.as_deref() else {
            return Ok(record.status);
        };

        let Some(remote) = self.provider.get_deployment(remote_id).await? else {
            warn!(deployment_id = %remote_id, "deployment unknown to provider");
            return Ok(record.status);
        };

        let status = DeploymentStatus::from_remote(remote.state);
        if status != record.status || remote.url != record.url {
            self.store
                .update_deployment_status(id, status, remote.url.as_deref())
                .await?;
        }

        Ok(status)
    }

    /// Get a deployment record.
    pub async fn get(&self, id: &RecordId) -> ControlResult<Option<DeploymentRecord>> {
        self.store.get_deployment(id).await
    }
}

impl std::fmt::Debug for DeploymentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use parallax_vercel::{DeploymentState, MockVercel};

    fn make_manager() -> (DeploymentManager, Arc<MemoryStore>, Arc<MockVercel>) {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(MockVercel::new());
        let manager = DeploymentManager::new(
            Arc::clone(&store) as Arc<dyn PlatformStore>,
            Arc::clone(&provider) as Arc<dyn VercelApi>,
        );
        (manager, store, provider)
    }

    async fn insert_queued(
        store: &MemoryStore,
        tenant: Option<TenantId>,
        remote_id: Option<&str>,
    ) -> RecordId {
        let record = DeploymentRecord::new(tenant, remote_id.map(ToOwned::to_owned), None);
        let id = record.id.clone();
        store.insert_deployment(&record).await.expect("insert failed");
        id
    }

    #[tokio::test]
    async fn cancel_batch_with_one_failure() {
        let (manager, store, provider) = make_manager();

        provider.add_deployment("dpl_ok", DeploymentState::Queued);
        provider.add_deployment("dpl_bad", DeploymentState::Queued);
        provider.fail_cancel("dpl_bad");

        let ok_id = insert_queued(&store, None, Some("dpl_ok")).await;
        let bad_id = insert_queued(&store, None, Some("dpl_bad")).await;
        let local_id = insert_queued(&store, None, None).await;

        let report = manager.cancel_queued(None).await.expect("cancel failed");

        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.total_processed, 3);
        assert_eq!(report.results.len(), 3);
        assert!(!report.message.contains("for tenant"));

        // Failed item keeps its local record; the others are gone.
        assert!(store.get_deployment(&bad_id).await.unwrap().is_some());
        assert!(store.get_deployment(&ok_id).await.unwrap().is_none());
        assert!(store.get_deployment(&local_id).await.unwrap().is_none());

        let ok_item = report
            .results
            .iter()
            .find(|r| r.deployment_id == "dpl_ok")
            .unwrap();
        assert_eq!(ok_item.status, CancelStatus::Success);
        assert_eq!(ok_item.vercel_state.as_deref(), Some("CANCELED"));

        let bad_item = report
            .results
            .iter()
            .find(|r| r.deployment_id == "dpl_bad")
            .unwrap();
        assert_eq!(bad_item.status, CancelStatus::Error);
        assert!(bad_item.error.is_some());
        assert!(bad_item.vercel_state.is_none());

        let local_item = report
            .results
            .iter()
            .find(|r| r.deployment_id == local_id.as_str())
            .unwrap();
        assert_eq!(local_item.status, CancelStatus::Success);
        assert!(local_item.note.as_deref().unwrap().contains("local record only"));
    }

    #[tokio::test]
    async fn cancel_with_tenant_filter() {
        let (manager, store, provider) = make_manager();

        let tenant = TenantId::generate();
        let other = TenantId::generate();

        provider.add_deployment("dpl_t", DeploymentState::Queued);
        provider.add_deployment("dpl_o", DeploymentState::Queued);

        let tenant_record = insert_queued(&store, Some(tenant.clone()), Some("dpl_t")).await;
        let other_record = insert_queued(&store, Some(other.clone()), Some("dpl_o")).await;

        let report = manager
            .cancel_queued(Some(&tenant))
            .await
            .expect("cancel failed");

        assert_eq!(report.success_count, 1);
        assert_eq!(report.total_processed, 1);
        assert!(report.message.contains("for tenant"));
        assert!(report.message.contains(tenant.as_str()));

        assert!(store.get_deployment(&tenant_record).await.unwrap().is_none());
        assert!(store.get_deployment(&other_record).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cancel_with_no_matches() {
        let (manager, _store, _provider) = make_manager();

        let tenant = TenantId::generate();
        let report = manager
            .cancel_queued(Some(&tenant))
            .await
            .expect("cancel failed");

        assert_eq!(report.success_count, 0);
        assert_eq!(report.error_count, 0);
        assert_eq!(report.total_processed, 0);
        assert!(report.results.is_empty());
        assert!(report.message.contains("for tenant"));
    }

    #[tokio::test]
    async fn cancel_skips_non_queued() {
        let (manager, store, provider) = make_manager();

        provider.add_deployment("dpl_ready", DeploymentState::Ready);

        let mut record = DeploymentRecord::new(None, Some("dpl_ready".to_owned()), None);
        record.status = DeploymentStatus::Ready;
        let id = record.id.clone();
        store.insert_deployment(&record).await.expect("insert failed");

        let report = manager.cancel_queued(None).await.expect("cancel failed");
        assert_eq!(report.total_processed, 0);
        assert!(store.get_deployment(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn refresh_status_updates_record() {
        let (manager, store, provider) = make_manager();

        provider.add_deployment("dpl_1", DeploymentState::Building);
        let id = insert_queued(&store, None, Some("dpl_1")).await;

        let status = manager.refresh_status(&id).await.expect("refresh failed");
        assert_eq!(status, DeploymentStatus::Building);

        let record = store.get_deployment(&id).await.unwrap().unwrap();
        assert_eq!(record.status, DeploymentStatus::Building);
    }

    #[tokio::test]
    async fn refresh_status_without_remote_id() {
        let (manager, store, _provider) = make_manager();

        let id = insert_queued(&store, None, None).await;
        let status = manager.refresh_status(&id).await.expect("refresh failed");
        assert_eq!(status, DeploymentStatus::Queued);
    }
}
