//! Error types for vulnscout

use thiserror::Error;

/// Main error type for vulnscout operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("Payload file '{path}': {reason}")]
    PayloadFileError { path: String, reason: String },

    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl ScanError {
    /// True for errors raised while building or decoding a probe rather than sending it
    pub fn is_decode(&self) -> bool {
        matches!(self, ScanError::DecodeError(_) | ScanError::JsonError(_))
    }
}

/// Result type alias for vulnscout operations
pub type Result<T> = std::result::Result<T, ScanError>;
