use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hoard_index::{AttributeStore, InMemoryAttributeStore};
use hoard_sdk::Hoard;
use hoard_store::{FsObjectBackend, InMemoryObjectBackend, ObjectBackend};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{ServerConfig, StorageConfig};
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// hoard HTTP server.
pub struct HoardServer {
    config: ServerConfig,
    hoard: Arc<Hoard>,
}

impl HoardServer {
    /// Validate the config, open the backends, and create the bucket and
    /// index domain if they are missing.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let hoard = Arc::new(build_hoard(&config));
        hoard.init().await?;
        Ok(Self { config, hoard })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn hoard(&self) -> &Arc<Hoard> {
        &self.hoard
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(self.hoard.clone(), self.config.max_upload_bytes))
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until the process exits.
    pub async fn serve_on(self, listener: TcpListener) -> ServerResult<()> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serve on `listener` until `signal` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        let app = self.router();
        info!(
            %addr,
            bucket = %self.hoard.bucket(),
            domain = %self.hoard.index_domain(),
            version = env!("CARGO_PKG_VERSION"),
            "hoard server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("hoard server stopped");
        Ok(())
    }
}

fn build_hoard(config: &ServerConfig) -> Hoard {
    let objects: Arc<dyn ObjectBackend> = match &config.storage {
        StorageConfig::Memory => Arc::new(InMemoryObjectBackend::new(config.bucket.clone())),
        StorageConfig::Filesystem { root } => {
            Arc::new(FsObjectBackend::new(root, config.bucket.clone()))
        }
    };
    // Index data is held in memory whichever object storage is chosen.
    let attributes: Arc<dyn AttributeStore> =
        Arc::new(InMemoryAttributeStore::new(config.index_domain.clone()));
    Hoard::new(objects, attributes)
        .with_page_size(config.page_size)
        .with_counter_budget(config.counter_budget.into())
        .with_read_verification(config.verify_reads)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
