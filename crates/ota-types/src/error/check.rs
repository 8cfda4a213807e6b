//! Update-check (device poll) errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RegistryError;

/// Rejections produced by the update decision engine.
///
/// `Unauthorized` and `AuthenticationFailed` are deliberately distinct: the
/// first means the MAC is not on the fleet list, the second that the token
/// did not match.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum CheckError {
    /// Missing or malformed poll parameters
    #[error("{message}")]
    BadRequest { message: String },

    /// Device is not registered
    #[error("Device not authorized")]
    Unauthorized { mac: String },

    /// Claimed token does not match the derived one
    #[error("Authentication failed")]
    AuthenticationFailed { mac: String },

    /// Registry could not be read
    #[error("Registry error: {0}")]
    Registry(RegistryError),
}

impl CheckError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Get HTTP status code for this error.
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::Unauthorized { .. } => 403,
            Self::AuthenticationFailed { .. } => 401,
            Self::Registry(_) => 500,
        }
    }
}

impl From<RegistryError> for CheckError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}
