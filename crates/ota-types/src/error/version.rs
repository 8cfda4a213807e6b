//! Version parsing errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a dotted version string.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum VersionError {
    /// The string is not 1-3 dot-separated non-negative integers
    #[error("Invalid version format '{version}': {reason}")]
    InvalidVersionFormat {
        /// The rejected input
        version: String,
        /// Which rule the input broke
        reason: String,
    },
}
