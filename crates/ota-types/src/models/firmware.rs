//! Firmware artifact descriptors.

use serde::{Deserialize, Serialize};

/// A firmware binary stored on the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirmwareFile {
    pub filename: String,
    /// Lowercase hex MD5, the value devices verify after download
    pub checksum: String,
    /// Lowercase hex SHA-256
    pub sha256: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

/// Response after a firmware upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirmwareUploadResponse {
    pub filename: String,
    pub checksum: String,
    pub size: u64,
    pub success: bool,
    /// Download URL to put into a device policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
