//! Service lifecycle management.
//!
//! Provides the main service runner with signal handling and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use parallax_vercel::{MockVercel, VercelApi, VercelClient};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api;
use crate::config::{ControlConfig, ProviderType};
use crate::credentials::active_credential;
use crate::deployment::DeploymentManager;
use crate::error::{ControlError, ControlResult};
use crate::store::{MemoryStore, PlatformStore, PostgresStore};
use crate::sync::SyncRunner;

/// The control service.
///
/// Manages the lifecycle of the control plane, including:
/// - Database connections
/// - Provider client selection
/// - Background reconciliation loop
/// - HTTP API server
/// - Signal handling and graceful shutdown
pub struct ControlService {
    config: ControlConfig,
    cancel: CancellationToken,
}

impl ControlService {
    /// Create a new control service with the given configuration.
    #[must_use]
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Run the control service.
    ///
    /// This will:
    /// 1. Connect to the database (or use in-memory store as fallback)
    /// 2. Select the provider client from persisted credentials
    /// 3. Create the deployment manager
    /// 4. Start the background sync loop (when enabled)
    /// 5. Start the HTTP API server
    /// 6. Wait for shutdown signal
    pub async fn run(&self) -> ControlResult<()> {
        let store = self.create_store().await;
        let provider = self.create_provider(&store).await?;

        let manager = Arc::new(DeploymentManager::new(
            Arc::clone(&store),
            Arc::clone(&provider),
        ));
        info!("deployment manager initialised");

        let sync_task = if self.config.sync.enabled {
            let runner = SyncRunner::new(
                Arc::clone(&store),
                Arc::clone(&provider),
                Duration::from_secs(self.config.sync.interval_secs),
            );
            let cancel = self.cancel.clone();
            Some(tokio::spawn(async move { runner.run(cancel).await }))
        } else {
            info!("sync loop disabled");
            None
        };

        let state = api::AppState {
            manager,
            store: Arc::clone(&store),
            env_credential: self.config.vercel.env_credential(),
        };

        let app = api::router(state);

        info!(listen = %self.config.server.listen, "control service listening");

        serve(self.config.server.listen, app, self.cancel.clone()).await?;

        // The serve future only resolves after shutdown; stop the sync
        // loop too and wait for it to finish.
        self.cancel.cancel();
        if let Some(task) = sync_task {
            if let Err(e) = task.await {
                warn!(error = %e, "sync task did not shut down cleanly");
            }
        }

        info!("control service shutdown complete");
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn create_store(&self) -> Arc<dyn PlatformStore> {
        match PostgresStore::new(&self.config.database.url).await {
            Ok(store) => {
                info!(url = %self.config.database.url, "connected to PostgreSQL");
                Arc::new(store)
            }
            Err(e) => {
                error!(
                    error = %e,
                    "failed to connect to PostgreSQL, using in-memory store"
                );
                Arc::new(MemoryStore::new())
            }
        }
    }

    /// Select the provider client.
    ///
    /// The credential comes from the persisted settings record, with the
    /// configuration-derived fallback behind it. When no credential is
    /// available at all (or the mock is configured), a mock client is used
    /// so the service still starts.
    async fn create_provider(
        &self,
        store: &Arc<dyn PlatformStore>,
    ) -> ControlResult<Arc<dyn VercelApi>> {
        if self.config.vercel.provider_type == ProviderType::Mock {
            info!("mock provider configured");
            return Ok(Arc::new(MockVercel::new()));
        }

        let settings = store.get_settings().await?;
        let fallback = self.config.vercel.env_credential();
        let Some(credential) = active_credential(&settings.credentials, fallback.as_ref()) else {
            warn!("no provider credential available, using mock provider");
            return Ok(Arc::new(MockVercel::new()));
        };

        let mut client = VercelClient::with_options(
            credential.vercel_token,
            &self.config.vercel.api_url,
            Duration::from_secs(self.config.vercel.timeout_secs),
        )
        .map_err(ControlError::Provider)?;

        if let Some(team_id) = credential.vercel_team_id {
            client = client.with_team_id(team_id);
        }

        info!(
            account = %credential.account_name,
            api_url = %self.config.vercel.api_url,
            "provider client configured"
        );
        Ok(Arc::new(client))
    }
}

/// Serve an axum router with graceful shutdown.
async fn serve(
    addr: std::net::SocketAddr,
    app: axum::Router,
    cancel: CancellationToken,
) -> ControlResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ControlError::Config(format!("failed to bind {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .map_err(|e| ControlError::Config(format!("server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("received SIGTERM, initiating shutdown");
        }
        () = cancel.cancelled() => {
            info!("shutdown requested");
        }
    }
}
