//! Device identity errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a hardware address.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum IdentityError {
    /// Not six hex byte-pairs (with `:`/`-` separators or bare)
    #[error("Invalid MAC address format: '{value}'")]
    InvalidMacAddress {
        /// The rejected input
        value: String,
    },
}
