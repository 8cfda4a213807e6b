//! Wire response of the device poll endpoint.

use serde::{Deserialize, Serialize};

/// Body of a successful `GET /api/firmware` response.
///
/// A negative decision carries only `update_available: false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateCheckResponse {
    pub update_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl UpdateCheckResponse {
    /// Device is already on (or past) its target.
    pub const fn no_update() -> Self {
        Self { update_available: false, firmware_version: None, firmware_url: None, checksum: None }
    }

    /// A newer build is waiting for the device.
    pub fn available(
        firmware_version: impl Into<String>,
        firmware_url: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            update_available: true,
            firmware_version: Some(firmware_version.into()),
            firmware_url: Some(firmware_url.into()),
            checksum: Some(checksum.into()),
        }
    }
}
