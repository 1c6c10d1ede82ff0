//! Wire types for the Vercel API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A project on the hosting provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Provider-assigned project identifier.
    pub id: String,
    /// Project name.
    pub name: String,
}

/// An environment variable record on the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvRecord {
    /// Provider-assigned record identifier.
    pub id: String,
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
}

/// Deployment state as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentState {
    /// Waiting for a build slot.
    Queued,
    /// Build in progress.
    Building,
    /// Deployment being initialised.
    Initializing,
    /// Live and serving traffic.
    Ready,
    /// Build or deploy failed.
    Error,
    /// Cancelled before completion.
    Canceled,
}

impl DeploymentState {
    /// Get the state as the provider's uppercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Building => "BUILDING",
            Self::Initializing => "INITIALIZING",
            Self::Ready => "READY",
            Self::Error => "ERROR",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A deployment on the hosting provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Provider-assigned deployment identifier.
    #[serde(alias = "uid")]
    pub id: String,
    /// Public URL, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Current state.
    #[serde(alias = "readyState")]
    pub state: DeploymentState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_state_round_trip() {
        let state: DeploymentState = serde_json::from_str("\"QUEUED\"").unwrap();
        assert_eq!(state, DeploymentState::Queued);
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"QUEUED\"");
    }

    #[test]
    fn deployment_accepts_provider_aliases() {
        let json = r#"{"uid":"dpl_1","readyState":"CANCELED"}"#;
        let deployment: Deployment = serde_json::from_str(json).unwrap();
        assert_eq!(deployment.id, "dpl_1");
        assert_eq!(deployment.state, DeploymentState::Canceled);
        assert!(deployment.url.is_none());
    }
}
