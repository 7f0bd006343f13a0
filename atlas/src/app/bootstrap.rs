//! Application bootstrap implementation.
//!
//! This module contains `AtlasApp`, which starts the tile proxy's services
//! in order and stops them together.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::cache::SweepDaemon;
use crate::config::TileServerRegistry;
use crate::geodetic::GeodeticTransform;
use crate::provider::{AsyncHttpClient, ReqwestClient};
use crate::server;
use crate::service::TileProxy;

/// Atlas tile proxy with service lifecycle management.
///
/// Services are started in this order:
/// 1. The listening socket is bound, so a busy port fails before anything runs
/// 2. The cache sweep daemon
/// 3. The HTTP server over a [`TileProxy`]
///
/// Both tasks stop when the app's cancellation token fires.
///
/// # Example
///
/// ```ignore
/// use atlas::app::{AtlasApp, AppConfig};
///
/// let app = AtlasApp::start(AppConfig::from_env()?).await?;
/// println!("listening on {}", app.local_addr());
///
/// // Later: graceful shutdown
/// app.shutdown().await?;
/// ```
pub struct AtlasApp {
    registry: Arc<TileServerRegistry>,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    server_task: JoinHandle<std::io::Result<()>>,
    sweep_task: JoinHandle<()>,
}

impl AtlasApp {
    /// Loads the rc file named by `config` and starts the application.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, the HTTP
    /// client cannot be built or the address cannot be bound.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let registry = TileServerRegistry::load(&config.rc_file, config.cache_root(), GeodeticTransform::national_grid())?;
        Self::start_with_registry(config, Arc::new(registry)).await
    }

    /// Starts the application over an already loaded registry.
    pub async fn start_with_registry(config: AppConfig, registry: Arc<TileServerRegistry>) -> Result<Self, AppError> {
        let client = ReqwestClient::with_timeout(config.fetch_timeout())?;
        Self::start_with_client(config, registry, client).await
    }

    /// Starts the application with a custom origin client.
    pub async fn start_with_client<C: AsyncHttpClient + 'static>(
        config: AppConfig,
        registry: Arc<TileServerRegistry>,
        client: C,
    ) -> Result<Self, AppError> {
        info!(servers = registry.len(), offline = config.offline, "Starting atlas tile proxy");

        // 1. Bind first
        let addr = config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(AppError::Server)?;

        let shutdown = CancellationToken::new();

        // 2. Cache sweep daemon
        let sweep = SweepDaemon::new(registry.caches(), config.sweep_interval());
        info!(interval_secs = sweep.interval().as_secs(), "Cache sweep daemon started");
        let sweep_task = tokio::spawn(sweep.run(shutdown.child_token()));

        // 3. HTTP server
        let proxy = Arc::new(TileProxy::new(Arc::clone(&registry), client, config.offline));
        let server_task = tokio::spawn(server::serve(listener, server::router(proxy), shutdown.child_token()));

        Ok(Self {
            registry,
            local_addr,
            shutdown,
            server_task,
            sweep_task,
        })
    }

    /// Runs the application on a dedicated runtime until `shutdown` fires.
    ///
    /// This is the entry point for synchronous callers such as the CLI.
    pub fn run_blocking(config: AppConfig, shutdown: CancellationToken) -> Result<(), AppError> {
        let runtime = Runtime::new().map_err(|e| AppError::RuntimeCreation(e.to_string()))?;
        runtime.block_on(async move {
            let mut app = Self::start(config).await?;
            info!(addr = %app.local_addr(), "Serving tiles; press Ctrl+C to stop");

            let stop = app.shutdown_token();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                stop.cancel();
            });
            app.wait().await
        })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<TileServerRegistry> {
        &self.registry
    }

    /// Token that stops the application when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Waits until the server stops, then stops the sweep daemon.
    pub async fn wait(&mut self) -> Result<(), AppError> {
        let result = (&mut self.server_task).await;
        self.shutdown.cancel();
        if let Err(e) = (&mut self.sweep_task).await {
            warn!(error = %e, "Cache sweep daemon ended abnormally");
        }
        match result {
            Ok(served) => served.map_err(AppError::Server),
            Err(e) => Err(AppError::Server(std::io::Error::other(e))),
        }
    }

    /// Stops every service and waits for them to finish.
    pub async fn shutdown(mut self) -> Result<(), AppError> {
        info!("Shutting down atlas tile proxy");
        self.shutdown.cancel();
        let result = self.wait().await;
        info!("Atlas tile proxy stopped");
        result
    }
}
