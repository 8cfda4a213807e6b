//! Unified error type for operations outside the poll path.

use serde::Serialize;
use thiserror::Error;

use ota_types::{ConfigError, RegistryError};

/// Main error type for firmware store, configuration and admin operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Firmware filename contains path components or is empty.
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Requested firmware file does not exist.
    #[error("Firmware file not found: {0}")]
    NotFound(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for OTA core operations.
pub type AppResult<T> = Result<T, AppError>;
