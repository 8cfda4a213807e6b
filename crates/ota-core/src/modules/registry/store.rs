//! Durable backing stores for the device registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ota_types::{DevicePolicy, MacAddress, RegistryError};

/// Whole-registry snapshot, keyed by canonical MAC.
pub type DeviceMap = BTreeMap<MacAddress, DevicePolicy>;

/// Storage abstraction behind [`super::DeviceRegistry`].
///
/// `save` must be durable when it returns `Ok`. Concurrent readers must
/// observe either the previous or the new snapshot, never a torn one.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn load(&self) -> Result<DeviceMap, RegistryError>;
    async fn save(&self, devices: &DeviceMap) -> Result<(), RegistryError>;
}

/// `devices.json`: one JSON object mapping MAC to policy.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DeviceStore for JsonFileStore {
    async fn load(&self) -> Result<DeviceMap, RegistryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Devices file not found, registry is empty");
                return Ok(DeviceMap::new());
            }
            Err(e) => {
                return Err(RegistryError::persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(DeviceMap::new());
        }

        let raw: BTreeMap<String, DevicePolicy> = serde_json::from_str(&content).map_err(|e| {
            RegistryError::persistence(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;

        let mut devices = DeviceMap::new();
        for (key, policy) in raw {
            let mac = MacAddress::parse(&key).map_err(|e| {
                RegistryError::persistence(format!("{} contains {}", self.path.display(), e))
            })?;
            if mac.as_str() != key {
                tracing::debug!(key = %key, mac = %mac, "Canonicalized registry key");
            }
            if devices.insert(mac.clone(), policy).is_some() {
                tracing::warn!(mac = %mac, "Duplicate device entry in registry file, keeping the last one");
            }
        }

        Ok(devices)
    }

    async fn save(&self, devices: &DeviceMap) -> Result<(), RegistryError> {
        let content = serde_json::to_string_pretty(devices)
            .map_err(|e| RegistryError::persistence(format!("Failed to serialize devices: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RegistryError::persistence(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, content.as_bytes()).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(RegistryError::persistence(format!("Failed to write temp devices file: {}", e)));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(RegistryError::persistence(format!("Failed to replace devices file: {}", e)));
        }

        tracing::debug!(path = %self.path.display(), count = devices.len(), "Saved devices");
        Ok(())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// In-process store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    devices: Mutex<DeviceMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: DeviceMap) -> Self {
        Self { devices: Mutex::new(devices) }
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn load(&self) -> Result<DeviceMap, RegistryError> {
        Ok(self.devices.lock().await.clone())
    }

    async fn save(&self, devices: &DeviceMap) -> Result<(), RegistryError> {
        *self.devices.lock().await = devices.clone();
        Ok(())
    }
}
