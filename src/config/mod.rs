//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files (partial files merge over defaults)
//! - Environment variables (`STEGO_*`, applied last)
//! - CLI arguments (for the binary)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StegoError};
use crate::schema::SchemaId;

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Compression configuration
    #[serde(default)]
    pub compression: CompressionConfig,

    /// API detection configuration
    #[serde(default)]
    pub api_compat: ApiCompatConfig,

    /// Custom rules file configuration
    #[serde(default)]
    pub custom_rules: CustomRulesConfig,

    /// Admin API configuration
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StegoError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| StegoError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Load the effective configuration.
    ///
    /// Reads `path` (or the default path) when the file exists, falls back
    /// to defaults otherwise, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);

        let config = match path {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_file(&path)?
            },
            Some(path) => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Self::default()
            },
            None => Self::default(),
        };

        Ok(config.with_env())
    }

    /// Apply `STEGO_*` environment overrides
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).and_then(|v| parse_bool(&v));

        // Compression settings
        if let Some(enabled) = flag("STEGO_COMPRESSION_ENABLED") {
            self.compression.enabled = enabled;
        }
        if let Some(strategy) = lookup("STEGO_STRATEGY") {
            self.compression.strategy = strategy;
        }
        if let Some(enabled) = flag("STEGO_LEARNED_ENABLED") {
            self.compression.learned_enabled = enabled;
        }
        if let Some(enabled) = flag("STEGO_DECOMPRESS_RESPONSES") {
            self.compression.decompress_responses = enabled;
        }

        // API detection
        if let Some(enabled) = flag("STEGO_API_COMPAT_ENABLED") {
            self.api_compat.enabled = enabled;
        }
        if let Some(apis) = lookup("STEGO_SUPPORTED_APIS") {
            let parsed: Vec<SchemaId> = apis
                .split(',')
                .filter_map(|name| match name.trim().parse() {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!("Ignoring STEGO_SUPPORTED_APIS entry: {}", e);
                        None
                    },
                })
                .collect();
            self.api_compat.supported_apis = parsed;
        }

        // Custom rules
        if let Some(enabled) = flag("STEGO_CUSTOM_RULES_ENABLED") {
            self.custom_rules.enabled = enabled;
        }
        if let Some(path) = lookup("STEGO_CUSTOM_RULES_PATH") {
            self.custom_rules.path = Some(PathBuf::from(path));
        }

        // Admin API
        if let Some(host) = lookup("STEGO_ADMIN_HOST") {
            self.admin.host = host;
        }
        if let Some(port) = lookup("STEGO_ADMIN_PORT").and_then(|p| p.parse().ok()) {
            self.admin.port = port;
        }

        self
    }

    /// Default config directory (`<config_dir>/stego`)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stego"))
    }

    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Compression configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Enable compression (false = passthrough mode)
    pub enabled: bool,

    /// Requested strategy name
    pub strategy: String,

    /// Run the learned stage before the primary strategy
    #[serde(alias = "deep_learning_enabled")]
    pub learned_enabled: bool,

    /// Decompress response text instead of passing it through
    pub decompress_responses: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: "dictionary".to_string(),
            learned_enabled: false,
            decompress_responses: false,
        }
    }
}

/// API detection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiCompatConfig {
    /// Global detection switch
    pub enabled: bool,

    /// Schemas to detect, in registration order
    pub supported_apis: Vec<SchemaId>,
}

impl Default for ApiCompatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            supported_apis: SchemaId::all().to_vec(),
        }
    }
}

/// Custom rules file configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRulesConfig {
    /// Load and save custom rules
    pub enabled: bool,

    /// Custom rules JSON file
    pub path: Option<PathBuf>,
}

impl Default for CustomRulesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: Config::config_dir().map(|p| p.join("custom_rules.json")),
        }
    }
}

impl CustomRulesConfig {
    /// Path to use, if custom rules are enabled
    pub fn active_path(&self) -> Option<&Path> {
        if self.enabled {
            self.path.as_deref()
        } else {
            None
        }
    }
}

/// Admin API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AdminConfig {
    /// Get the full listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
