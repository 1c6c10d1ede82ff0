//! Typed client for the Vercel REST API.
//!
//! This crate provides a trait-based abstraction over the provider
//! operations the control plane depends on: project lifecycle,
//! environment variable upserts, and deployment lookup/cancellation.
//!
//! # Implementations
//!
//! - [`VercelClient`]: reqwest-backed client against the real API
//! - [`MockVercel`]: in-memory implementation for tests and offline use
//!
//! The remote API is treated as opaque: responses are surfaced as-is
//! (notably the deployment `state` field), and no retries are performed
//! here. Callers decide how to react to individual failures.

#![forbid(unsafe_code)]

mod client;
mod error;
mod mock;
mod traits;
mod types;

pub use client::VercelClient;
pub use error::{VercelError, VercelResult};
pub use mock::MockVercel;
pub use traits::VercelApi;
pub use types::{Deployment, DeploymentState, EnvRecord, Project};
