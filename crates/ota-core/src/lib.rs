//! # OTA Core
//!
//! Device authentication and update-decision protocol for the OTA server.
//!
//! ```text
//! ota-core/src/
//! ├── protocol/
//! │   ├── version.rs   # dotted version parsing and ordering
//! │   ├── auth.rs      # MAC + shared secret → device token
//! │   └── engine.rs    # one poll → one update decision
//! └── modules/
//!     ├── registry/    # authoritative device → policy map + stores
//!     ├── firmware.rs  # firmware artifact directory
//!     ├── config.rs    # config.json + OTA_SERVER_* overrides
//!     ├── paths.rs     # data directory resolution
//!     └── logger.rs    # tracing subscriber setup
//! ```
//!
//! The device firmware computes the same token and compares versions the
//! same way. Both algorithms are wire contracts with deployed hardware.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod modules;
pub mod protocol;

pub use error::{AppError, AppResult};
pub use modules::firmware::FirmwareStore;
pub use modules::registry::{DeviceRegistry, DeviceStore, JsonFileStore, MemoryStore};
pub use protocol::auth::{derive_token, verify_token, AuthToken, SharedSecret};
pub use protocol::engine::{Clock, SystemClock, UpdateCheckRequest, UpdateDecisionEngine};
pub use protocol::version::{compare_versions, SemVer};
