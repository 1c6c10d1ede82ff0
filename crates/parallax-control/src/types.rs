//! Core types for parallax-control.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a new tenant ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique tenant ID using ULID.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a locally stored record (env variable or
/// deployment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new record ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique record ID using ULID.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A tenant: a customer/project unit whose deployments and environment
/// variables are tracked locally and mirrored against the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant identifier.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// URL-safe slug, used as the remote project name.
    pub slug: String,
    /// Remote project backing this tenant, once provisioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// When the tenant was created.
    pub created_at: DateTime<Utc>,
    /// When the tenant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new tenant with a generated ID.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TenantId::generate(),
            name: name.into(),
            slug: slug.into(),
            project_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A tenant-scoped environment variable, mirrored to the provider by the
/// sync loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVariable {
    /// Unique record identifier.
    pub id: RecordId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
    /// Provider-side record ID, set once pushed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    /// When the variable was created.
    pub created_at: DateTime<Utc>,
    /// When the variable was last updated.
    pub updated_at: DateTime<Utc>,
}

impl EnvVariable {
    /// Create a new environment variable with a generated ID.
    #[must_use]
    pub fn new(tenant_id: TenantId, key: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::generate(),
            tenant_id,
            key: key.into(),
            value: value.into(),
            remote_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status of a locally recorded deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Remote build/deploy not yet started or confirmed.
    Queued,
    /// Remote build in progress.
    Building,
    /// Live on the provider.
    Ready,
    /// Remote build or deploy failed.
    Error,
    /// Cancelled before completion.
    Canceled,
}

impl DeploymentStatus {
    /// Get the status name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Canceled => "canceled",
        }
    }

    /// Whether this status will never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error | Self::Canceled)
    }

    /// Map a provider-reported state onto a local status.
    #[must_use]
    pub const fn from_remote(state: parallax_vercel::DeploymentState) -> Self {
        use parallax_vercel::DeploymentState as Remote;
        match state {
            Remote::Queued => Self::Queued,
            Remote::Building | Remote::Initializing => Self::Building,
            Remote::Ready => Self::Ready,
            Remote::Error => Self::Error,
            Remote::Canceled => Self::Canceled,
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "building" => Ok(Self::Building),
            "ready" => Ok(Self::Ready),
            "error" => Ok(Self::Error),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("unknown deployment status: {s}")),
        }
    }
}

/// A locally recorded deployment.
///
/// `deployment_id` is the remote identifier; it may be absent for records
/// that never reached the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Unique record identifier.
    pub id: RecordId,
    /// Owning tenant, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    /// Remote deployment identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    /// Public URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Current status.
    pub status: DeploymentStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Create a new deployment record in the queued status.
    #[must_use]
    pub fn new(
        tenant_id: Option<TenantId>,
        deployment_id: Option<String>,
        url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::generate(),
            tenant_id,
            deployment_id,
            url,
            status: DeploymentStatus::Queued,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A provider credential entry on the global settings record.
///
/// After normalization at most one entry is active; the active entry is
/// the one used for all outbound provider calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Human-readable account label.
    pub account_name: String,
    /// Provider API token.
    pub vercel_token: String,
    /// Team scope for the token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vercel_team_id: Option<String>,
    /// Whether this entry is the one in use.
    pub active: bool,
}

/// The global platform settings record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Provider credentials. Normalized on every write.
    #[serde(default)]
    pub credentials: Vec<Credential>,
}
