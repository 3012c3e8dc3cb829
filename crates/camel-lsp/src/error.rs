//! Error types for camel-lsp

use thiserror::Error;

/// Result type alias for camel-lsp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration, catalogs or documents
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Component catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON schema or settings error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Malformed XML route document
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
}
