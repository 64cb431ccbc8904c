//! Stego error types.
//!
//! Nothing in the interception path surfaces these to the transport: the
//! pipeline turns every failure into a pass-through. They exist so the
//! individual stages (path write-back, rule loading, config, admin API)
//! can report what went wrong through `Result` and `?`.

use thiserror::Error;

/// Stego errors.
#[derive(Error, Debug)]
pub enum StegoError {
    /// Compression operation failed.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Decompression operation failed.
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Strategy could not be built or run.
    #[error("Strategy error: {0}")]
    Strategy(String),

    /// A field path no longer resolves against the document.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Request or response body is not a usable JSON document.
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// Custom rules source is missing or malformed.
    #[error("Custom rules error: {0}")]
    CustomRules(String),

    /// Server-side error.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Stego operations
pub type Result<T> = std::result::Result<T, StegoError>;

impl From<toml::de::Error> for StegoError {
    fn from(err: toml::de::Error) -> Self {
        StegoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StegoError {
    fn from(err: toml::ser::Error) -> Self {
        StegoError::Config(err.to_string())
    }
}
