//! # OTA Types
//!
//! Domain models and error definitions for the OTA update server.
//!
//! - **`error`** - Typed error hierarchy for identities, versions, the device
//!   registry and the update-check protocol
//! - **`models`** - Device identity, device policy records, wire responses,
//!   firmware descriptors and server configuration
//!
//! ## Architecture Role
//!
//! `ota-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!      ota-types (this crate)
//!            │
//!            ▼
//!        ota-core
//!            │
//!            ▼
//!       ota-server
//! ```

pub mod error;
pub mod models;

pub use error::{CheckError, ConfigError, IdentityError, RegistryError, VersionError};

pub use models::{
    DevicePolicy, DevicePolicyUpdate, FirmwareFile, FirmwareUploadResponse, MacAddress,
    ServerConfig, UpdateCheckResponse,
};
