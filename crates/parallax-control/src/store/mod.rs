//! Storage backends for tenant, environment variable, deployment, and
//! settings records.
//!
//! The primary implementation uses PostgreSQL; an in-memory implementation
//! is provided for testing and as a degraded-mode fallback.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;

use crate::error::ControlResult;
use crate::types::{
    DeploymentRecord, DeploymentStatus, EnvVariable, PlatformSettings, RecordId, Tenant, TenantId,
};

/// Filter criteria for listing deployment records.
#[derive(Debug, Clone, Default)]
pub struct DeploymentFilter {
    /// Filter by owning tenant.
    pub tenant_id: Option<TenantId>,
    /// Filter by status.
    pub status: Option<DeploymentStatus>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

impl DeploymentFilter {
    /// Create a new empty filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tenant_id: None,
            status: None,
            limit: None,
            offset: None,
        }
    }

    /// Filter by tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Filter by status.
    #[must_use]
    pub const fn with_status(mut self, status: DeploymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set maximum results.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set pagination offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Backend for the control plane's local records.
///
/// Implementations provide plain CRUD; consistency between local records
/// and remote provider state is the sync loop's job, not the store's.
#[async_trait]
pub trait PlatformStore: Send + Sync {
    /// Insert a new tenant.
    ///
    /// Returns an error if a tenant with the same ID already exists.
    async fn insert_tenant(&self, tenant: &Tenant) -> ControlResult<()>;

    /// Get a tenant by ID.
    async fn get_tenant(&self, id: &TenantId) -> ControlResult<Option<Tenant>>;

    /// List all tenants, ordered by `created_at` descending.
    async fn list_tenants(&self) -> ControlResult<Vec<Tenant>>;

    /// Record the remote project backing a tenant.
    async fn set_tenant_project(&self, id: &TenantId, project_id: &str) -> ControlResult<()>;

    /// Delete a tenant.
    ///
    /// The tenant's environment variables are deleted with it; its
    /// deployment records are detached (tenant reference cleared) so
    /// cancellation history survives.
    async fn delete_tenant(&self, id: &TenantId) -> ControlResult<()>;

    /// Insert a new environment variable record.
    async fn insert_env_variable(&self, variable: &EnvVariable) -> ControlResult<()>;

    /// List environment variables for a tenant, ordered by key.
    async fn list_env_variables(&self, tenant_id: &TenantId) -> ControlResult<Vec<EnvVariable>>;

    /// Record the provider-side ID after a variable has been pushed.
    async fn mark_env_pushed(&self, id: &RecordId, remote_id: &str) -> ControlResult<()>;

    /// Delete an environment variable record.
    async fn delete_env_variable(&self, id: &RecordId) -> ControlResult<()>;

    /// Insert a new deployment record.
    async fn insert_deployment(&self, record: &DeploymentRecord) -> ControlResult<()>;

    /// Get a deployment record by its local ID.
    async fn get_deployment(&self, id: &RecordId) -> ControlResult<Option<DeploymentRecord>>;

    /// List deployment records matching the filter criteria.
    ///
    /// Results are ordered by `created_at` descending (newest first).
    async fn list_deployments(
        &self,
        filter: &DeploymentFilter,
    ) -> ControlResult<Vec<DeploymentRecord>>;

    /// Update a deployment record's status (and URL when one is known).
    ///
    /// Also bumps the `updated_at` timestamp.
    async fn update_deployment_status(
        &self,
        id: &RecordId,
        status: DeploymentStatus,
        url: Option<&str>,
    ) -> ControlResult<()>;

    /// Delete a deployment record.
    async fn delete_deployment(&self, id: &RecordId) -> ControlResult<()>;

    /// Get the global settings record.
    ///
    /// Returns default (empty) settings when none have been stored yet.
    async fn get_settings(&self) -> ControlResult<PlatformSettings>;

    /// Replace the global settings record.
    async fn put_settings(&self, settings: &PlatformSettings) -> ControlResult<()>;
}
