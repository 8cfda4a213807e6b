//! Application State
//!
//! Holds shared state for the server: configuration, the device registry,
//! the decision engine and the firmware store.

use std::path::Path;
use std::sync::Arc;

use ota_core::modules::paths;
use ota_core::{DeviceRegistry, FirmwareStore, SharedSecret, UpdateDecisionEngine};
use ota_types::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config: ServerConfig,
    pub engine: UpdateDecisionEngine,
    pub firmware: FirmwareStore,
}

impl AppState {
    /// Create AppState with pre-initialized components
    pub fn new_with_components(
        config: ServerConfig,
        registry: Arc<DeviceRegistry>,
        firmware: FirmwareStore,
    ) -> Self {
        let engine =
            UpdateDecisionEngine::new(registry, SharedSecret::new(config.shared_secret_key.clone()));
        Self { inner: Arc::new(AppStateInner { config, engine, firmware }) }
    }

    /// Resolve storage paths against `data_dir` and build the state.
    pub fn from_config(config: ServerConfig, data_dir: &Path) -> Self {
        let registry = Arc::new(open_registry(&config, data_dir));
        let firmware = open_firmware_store(&config, data_dir);
        Self::new_with_components(config, registry, firmware)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn engine(&self) -> &UpdateDecisionEngine {
        &self.inner.engine
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        self.inner.engine.registry()
    }

    pub fn firmware(&self) -> &FirmwareStore {
        &self.inner.firmware
    }
}

/// The JSON-file registry shared by the server and the `device` commands.
pub fn open_registry(config: &ServerConfig, data_dir: &Path) -> DeviceRegistry {
    DeviceRegistry::open_json(paths::resolve(data_dir, &config.devices_file))
}

pub fn open_firmware_store(config: &ServerConfig, data_dir: &Path) -> FirmwareStore {
    FirmwareStore::new(paths::resolve(data_dir, &config.firmware_directory))
}
