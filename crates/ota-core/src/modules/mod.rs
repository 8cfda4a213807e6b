//! Persistence, configuration and process-level helpers.

pub mod config;
pub mod firmware;
pub mod logger;
pub mod paths;
pub mod registry;
