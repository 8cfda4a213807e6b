//! Device registry errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during device registry operations.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum RegistryError {
    /// No record for this device
    #[error("Device not found: {mac}")]
    NotFound {
        /// Canonical MAC of the missing device
        mac: String,
    },

    /// A create-only registration hit an existing record
    #[error("Device already exists: {mac}")]
    AlreadyExists {
        /// Canonical MAC of the existing device
        mac: String,
    },

    /// Policy rejected before it reached the store
    #[error("Invalid policy field {field}: {message}")]
    InvalidPolicy {
        /// Name of the offending field
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// The backing store could not be read or flushed
    #[error("Registry persistence failure: {message}")]
    Persistence {
        /// Description of the storage failure
        message: String,
    },
}

impl RegistryError {
    /// Create a persistence error from anything displayable.
    pub fn persistence(e: impl std::fmt::Display) -> Self {
        Self::Persistence { message: e.to_string() }
    }

    /// Check if this error was caused by the caller's input.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::AlreadyExists { .. } | Self::InvalidPolicy { .. }
        )
    }

    /// Get HTTP status code for this error.
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } => 409,
            Self::InvalidPolicy { .. } => 400,
            Self::Persistence { .. } => 500,
        }
    }
}
