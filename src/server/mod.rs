//! Admin HTTP API.
//!
//! JSON endpoints for operating a running pipeline:
//! - Status and metrics
//! - Compression, learned-stage and strategy settings
//! - Saving and reloading custom rules
//! - Direct text compression/decompression
//!
//! # Example
//!
//! ```rust,ignore
//! use stego::server::{Server, ServerConfig};
//!
//! let config = ServerConfig::default().with_port(8080);
//! let server = Server::new(config, interceptor);
//! server.run().await?;
//! ```

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use tokio::net::TcpListener;

pub use config::ServerConfig;
pub use handlers::{create_router, health_check, TextResponse};
pub use state::AppState;

use crate::error::{Result, StegoError};
use crate::proxy::Interceptor;

/// Admin API server
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a server administering `interceptor`
    pub fn new(config: ServerConfig, interceptor: Arc<Interceptor>) -> Self {
        Self {
            state: Arc::new(AppState::new(config, interceptor)),
        }
    }

    /// Router for the admin API
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }

    /// Bind and serve until the process exits
    pub async fn run(&self) -> Result<()> {
        let addr = self.state.config.addr;
        let snapshot = self.state.engine().snapshot();

        tracing::info!("Stego admin API starting...");
        tracing::info!(
            "Strategy: {} (active: {}), {} rules",
            snapshot.requested,
            snapshot.kind,
            snapshot.table.len()
        );
        tracing::info!(
            "Compression: {}",
            if self.state.interceptor.compression_enabled() { "enabled" } else { "disabled" }
        );

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StegoError::Server(format!("Failed to bind to {addr}: {e}")))?;
        tracing::info!("Listening on http://{}", addr);

        axum::serve(listener, self.router())
            .await
            .map_err(|e| StegoError::Server(format!("Server error: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StegoEngine;

    fn server(config: ServerConfig) -> Server {
        Server::new(config, Arc::new(Interceptor::new(Arc::new(StegoEngine::new()))))
    }

    #[test]
    fn test_bind_conflict_is_server_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let err = tokio_test::block_on(server(ServerConfig::default().with_addr(addr)).run())
            .unwrap_err();
        assert!(matches!(err, StegoError::Server(_)));
    }

    #[test]
    fn test_router_builds_without_layers() {
        let config = ServerConfig::default().without_logging().without_cors();
        let _router = server(config).router();
    }
}
