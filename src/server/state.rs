//! Shared admin server state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::ServerConfig;
use crate::codec::StegoEngine;
use crate::proxy::Interceptor;

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Pipeline being administered
    pub interceptor: Arc<Interceptor>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServerConfig, interceptor: Arc<Interceptor>) -> Self {
        Self {
            config,
            interceptor,
            start_time: Instant::now(),
        }
    }

    /// Compression engine behind the pipeline
    pub fn engine(&self) -> &Arc<StegoEngine> {
        self.interceptor.engine()
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
