//! Core domain models for the OTA server.

mod config;
mod device;
mod firmware;
mod mac;
mod update;

pub use config::{ServerConfig, DEFAULT_ADMIN_API_KEY, DEFAULT_SHARED_SECRET};
pub use device::{DevicePolicy, DevicePolicyUpdate};
pub use firmware::{FirmwareFile, FirmwareUploadResponse};
pub use mac::MacAddress;
pub use update::UpdateCheckResponse;
