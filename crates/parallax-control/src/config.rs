//! Configuration for parallax-control.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::credentials::EnvCredential;
use crate::error::{ControlError, ControlResult};

/// Top-level configuration for the control service.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ControlConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Provider API configuration.
    #[serde(default)]
    pub vercel: VercelConfig,

    /// Background sync configuration.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl ControlConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `parallax.toml` in the current directory (if present)
    /// 3. Environment variables with `PARALLAX_CONTROL_` prefix
    pub fn load() -> ControlResult<Self> {
        Figment::new()
            .merge(Toml::file("parallax.toml"))
            .merge(Env::prefixed("PARALLAX_CONTROL_").split("__"))
            .extract()
            .map_err(|e| ControlError::Config(e.to_string()))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ControlResult<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PARALLAX_CONTROL_").split("__"))
            .extract()
            .map_err(|e| ControlError::Config(e.to_string()))
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_listen() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8086)
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_database_url() -> String {
    "postgres://localhost/parallax".to_owned()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Which provider client implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Real Vercel API client.
    #[default]
    Vercel,

    /// In-memory mock for testing and offline use.
    Mock,
}

/// Provider API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VercelConfig {
    /// Which client implementation to use.
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Base URL for the provider API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Fallback API token, used when no persisted credential is active.
    pub token: Option<String>,

    /// Fallback team scope for the token.
    pub team_id: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_vercel_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.vercel.com".to_owned()
}

const fn default_vercel_timeout_secs() -> u64 {
    10
}

impl Default for VercelConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            api_url: default_api_url(),
            token: None,
            team_id: None,
            timeout_secs: default_vercel_timeout_secs(),
        }
    }
}

impl VercelConfig {
    /// Build the environment-derived fallback credential, if the
    /// configuration carries a usable token.
    #[must_use]
    pub fn env_credential(&self) -> Option<EnvCredential> {
        EnvCredential::from_values(self.token.as_deref(), self.team_id.as_deref())
    }
}

/// Background sync configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Whether the sync loop runs at all.
    #[serde(default = "default_sync_enabled")]
    pub enabled: bool,

    /// How often to reconcile with the provider (seconds).
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,
}

const fn default_sync_enabled() -> bool {
    true
}

const fn default_sync_interval_secs() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_sync_enabled(),
            interval_secs: default_sync_interval_secs(),
        }
    }
}
