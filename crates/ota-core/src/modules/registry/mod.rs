//! Device registry: the single authority over device policy records.
//!
//! Every operation re-reads the store, so the server and the admin CLI can
//! share one `devices.json`. Mutations are serialized by a registry-wide
//! lock and flushed before they return; reads take no lock and rely on the
//! store's atomic replace.

mod store;

pub use store::{DeviceMap, DeviceStore, JsonFileStore, MemoryStore};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use ota_types::{DevicePolicy, DevicePolicyUpdate, MacAddress, RegistryError};

use crate::protocol::version::SemVer;

pub struct DeviceRegistry {
    store: Arc<dyn DeviceStore>,
    write_lock: Mutex<()>,
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self { store, write_lock: Mutex::new(()) }
    }

    /// Registry backed by a `devices.json` file.
    pub fn open_json(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileStore::new(path)))
    }

    /// Registry that lives only in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Snapshot of every record.
    pub async fn list(&self) -> Result<DeviceMap, RegistryError> {
        self.store.load().await
    }

    pub async fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.store.load().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len().await? == 0)
    }

    pub async fn get(&self, mac: &MacAddress) -> Result<DevicePolicy, RegistryError> {
        self.store
            .load()
            .await?
            .remove(mac)
            .ok_or_else(|| RegistryError::NotFound { mac: mac.to_string() })
    }

    /// Create or fully replace a record.
    pub async fn upsert(&self, mac: &MacAddress, policy: DevicePolicy) -> Result<(), RegistryError> {
        validate_target_version(&policy.target_version)?;

        let replaced = self
            .mutate(|devices| Ok((devices.insert(mac.clone(), policy).is_some(), true)))
            .await?;

        tracing::info!(mac = %mac, replaced, "Device policy saved");
        Ok(())
    }

    /// Create a record; fails if one already exists.
    pub async fn register(&self, mac: &MacAddress, policy: DevicePolicy) -> Result<(), RegistryError> {
        validate_target_version(&policy.target_version)?;

        self.mutate(|devices| {
            if devices.contains_key(mac) {
                return Err(RegistryError::AlreadyExists { mac: mac.to_string() });
            }
            devices.insert(mac.clone(), policy);
            Ok(((), true))
        })
        .await?;

        tracing::info!(mac = %mac, "Device registered");
        Ok(())
    }

    /// Merge `update` into an existing record and return the result.
    pub async fn update_fields(
        &self,
        mac: &MacAddress,
        update: DevicePolicyUpdate,
    ) -> Result<DevicePolicy, RegistryError> {
        if let Some(version) = &update.target_version {
            validate_target_version(version)?;
        }

        self.mutate(|devices| {
            let policy = devices
                .get_mut(mac)
                .ok_or_else(|| RegistryError::NotFound { mac: mac.to_string() })?;
            policy.apply(update);
            Ok((policy.clone(), true))
        })
        .await
    }

    /// Remove a record. `Ok(false)` if there was none.
    pub async fn delete(&self, mac: &MacAddress) -> Result<bool, RegistryError> {
        let removed = self
            .mutate(|devices| {
                let removed = devices.remove(mac).is_some();
                Ok((removed, removed))
            })
            .await?;

        if removed {
            tracing::info!(mac = %mac, "Device deleted");
        }
        Ok(removed)
    }

    /// Load, mutate, flush under the write lock. `f` returns the value to
    /// hand back and whether the map changed.
    async fn mutate<T, F>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut DeviceMap) -> Result<(T, bool), RegistryError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut devices = self.store.load().await?;
        let (value, changed) = f(&mut devices)?;
        if changed {
            self.store.save(&devices).await.map_err(|e| {
                tracing::error!("Registry flush failed: {}", e);
                e
            })?;
        }
        Ok(value)
    }
}

fn validate_target_version(version: &str) -> Result<(), RegistryError> {
    SemVer::parse(version).map(|_| ()).map_err(|e| RegistryError::InvalidPolicy {
        field: "target_version".to_string(),
        message: e.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::testing::FlakyStore;
    use super::*;

    fn mac(s: &str) -> MacAddress {
        MacAddress::parse(s).unwrap()
    }

    fn policy(version: &str) -> DevicePolicy {
        DevicePolicy::new("panic-button", version, "http://ota/firmware/pb.bin", "5d41402abc4b2a76")
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let registry = DeviceRegistry::in_memory();
        let m = mac("AA:BB:CC:DD:EE:FF");
        registry.upsert(&m, policy("1.2.1")).await.unwrap();
        assert_eq!(registry.get(&m).await.unwrap(), policy("1.2.1"));

        registry.upsert(&m, policy("1.3.0")).await.unwrap();
        assert_eq!(registry.get(&m).await.unwrap().target_version, "1.3.0");
        assert_eq!(registry.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_form_insensitive() {
        let registry = DeviceRegistry::in_memory();
        registry.upsert(&mac("aabbccddeeff"), policy("1.0")).await.unwrap();
        assert!(registry.get(&mac("AA-BB-CC-DD-EE-FF")).await.is_ok());
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_version() {
        let registry = DeviceRegistry::in_memory();
        let err = registry.upsert(&mac("AA:BB:CC:DD:EE:FF"), policy("1.x")).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPolicy { ref field, .. } if field == "target_version"));
        assert!(registry.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_register_is_create_only() {
        let registry = DeviceRegistry::in_memory();
        let m = mac("AA:BB:CC:DD:EE:FF");
        registry.register(&m, policy("1.0")).await.unwrap();
        let err = registry.register(&m, policy("2.0")).await.unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists { .. }));
        assert_eq!(registry.get(&m).await.unwrap().target_version, "1.0");
    }

    #[tokio::test]
    async fn test_update_fields_merges_subset() {
        let registry = DeviceRegistry::in_memory();
        let m = mac("AA:BB:CC:DD:EE:FF");
        registry.upsert(&m, policy("1.2.1").with_hardware_version("esp32-c3")).await.unwrap();

        let updated = registry
            .update_fields(
                &m,
                DevicePolicyUpdate { target_version: Some("1.3".to_string()), ..Default::default() },
            )
            .await
            .unwrap();

        assert_eq!(updated.target_version, "1.3");
        assert_eq!(updated.hardware_version, "esp32-c3");
        assert_eq!(updated.firmware_url, "http://ota/firmware/pb.bin");
        assert_eq!(registry.get(&m).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_fields_missing_and_invalid() {
        let registry = DeviceRegistry::in_memory();
        let m = mac("AA:BB:CC:DD:EE:FF");
        let err = registry.update_fields(&m, DevicePolicyUpdate::default()).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));

        registry.upsert(&m, policy("1.0")).await.unwrap();
        let err = registry
            .update_fields(
                &m,
                DevicePolicyUpdate { target_version: Some("one".to_string()), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPolicy { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = DeviceRegistry::in_memory();
        let m = mac("AA:BB:CC:DD:EE:FF");
        registry.upsert(&m, policy("1.0")).await.unwrap();

        assert!(registry.delete(&m).await.unwrap());
        assert!(!registry.delete(&m).await.unwrap());
        assert!(matches!(registry.get(&m).await, Err(RegistryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failed_flush_surfaces_and_leaves_store_unchanged() {
        let store = Arc::new(FlakyStore::default());
        let registry = DeviceRegistry::new(store.clone());
        let m = mac("AA:BB:CC:DD:EE:FF");
        registry.upsert(&m, policy("1.0")).await.unwrap();

        store.fail_saves(true);
        let err = registry.upsert(&m, policy("2.0")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Persistence { .. }));
        assert!(registry.delete(&m).await.is_err());

        assert_eq!(registry.get(&m).await.unwrap().target_version, "1.0");
    }

    #[tokio::test]
    async fn test_concurrent_field_updates_do_not_clobber() {
        let registry = Arc::new(DeviceRegistry::in_memory());
        let m = mac("AA:BB:CC:DD:EE:FF");
        registry.upsert(&m, policy("1.0")).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let registry = registry.clone();
            let m = m.clone();
            tasks.push(tokio::spawn(async move {
                let update = if i % 2 == 0 {
                    DevicePolicyUpdate { checksum: Some(format!("sum-{i}")), ..Default::default() }
                } else {
                    DevicePolicyUpdate {
                        current_version: Some(format!("0.{i}")),
                        ..Default::default()
                    }
                };
                registry.update_fields(&m, update).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let p = registry.get(&m).await.unwrap();
        assert!(p.checksum.starts_with("sum-"));
        assert!(p.current_version.unwrap().starts_with("0."));
        assert_eq!(p.target_version, "1.0");
    }
}
