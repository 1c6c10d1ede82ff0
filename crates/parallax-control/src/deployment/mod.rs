//! Deployment record orchestration.

mod manager;

pub use manager::{CancelItem, CancelReport, CancelStatus, DeploymentManager};
