//! Typed error definitions for the OTA server.
//!
//! Every error is:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants

mod check;
mod config;
mod identity;
mod registry;
mod version;

pub use check::CheckError;
pub use config::ConfigError;
pub use identity::IdentityError;
pub use registry::RegistryError;
pub use version::VersionError;
