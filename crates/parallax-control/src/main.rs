//! Parallax control service binary.
//!
//! Runs the control plane for tenant deployment management.

use tracing::info;
use tracing_subscriber::EnvFilter;

use parallax_control::{ControlConfig, ControlService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("parallax_control=info".parse()?),
        )
        .init();

    info!("Parallax control service starting");

    let config = ControlConfig::load().unwrap_or_else(|e| {
        info!(error = %e, "failed to load config, using defaults");
        ControlConfig::default()
    });

    info!(
        listen = %config.server.listen,
        database = %config.database.url,
        "configuration loaded"
    );

    let service = ControlService::new(config);
    service.run().await?;

    Ok(())
}
