//! Parallax control plane.
//!
//! The central management layer for tenant deployments on a Vercel-style
//! hosting provider. It tracks tenants, their environment variables, and
//! their deployment records locally, and reconciles them against the
//! provider's API.
//!
//! # Architecture
//!
//! The control plane is responsible for:
//!
//! - **Credential management**: A normalized list of provider credentials
//!   lives on the global settings record; at most one entry is active at
//!   a time, with an optional configuration-derived fallback.
//! - **Deployment bookkeeping**: Local deployment records mirror remote
//!   deployments and can be batch-cancelled while still queued.
//! - **Reconciliation**: A background loop provisions remote projects for
//!   tenants, pushes environment variables, and refreshes deployment
//!   statuses.
//! - **API surface**: HTTP endpoints for tenant, variable, deployment,
//!   and settings management.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod credentials;
pub mod deployment;
pub mod error;
pub mod service;
pub mod store;
pub mod sync;
pub mod types;

pub use config::ControlConfig;
pub use credentials::{active_credential, normalize_credentials, EnvCredential};
pub use deployment::{CancelItem, CancelReport, CancelStatus, DeploymentManager};
pub use error::{ControlError, ControlResult};
pub use service::ControlService;
pub use store::{DeploymentFilter, MemoryStore, PlatformStore, PostgresStore};
pub use sync::{SyncRunner, SyncSummary};
pub use types::{
    Credential, DeploymentRecord, DeploymentStatus, EnvVariable, PlatformSettings, RecordId,
    Tenant, TenantId,
};
