//! Admin server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Result, StegoError};

/// Admin server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: SocketAddr,
    /// Where `POST /api/custom_rules` saves and reload reads
    pub custom_rules_path: Option<PathBuf>,
    /// Enable request tracing
    pub logging: bool,
    /// CORS enabled
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            custom_rules_path: None,
            logging: true,
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Build from the `[admin]` and `[custom_rules]` sections
    pub fn from_config(config: &Config) -> Result<Self> {
        let listen = config.admin.listen_addr();
        let addr = listen
            .parse()
            .map_err(|e| StegoError::Config(format!("Invalid admin address {listen}: {e}")))?;

        Ok(Self {
            addr,
            custom_rules_path: config.custom_rules.active_path().map(PathBuf::from),
            ..Self::default()
        })
    }

    /// Create with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self
    }

    /// Set address directly
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set custom rules path
    pub fn with_custom_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_rules_path = Some(path.into());
        self
    }

    /// Disable request tracing
    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Disable CORS
    pub fn without_cors(mut self) -> Self {
        self.cors_enabled = false;
        self
    }
}
