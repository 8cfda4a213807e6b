//! The update protocol shared with device firmware.

pub mod auth;
pub mod engine;
pub mod version;
