use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use ota_core::modules::firmware::{calculate_file_md5, download_url, md5_hex};
use ota_core::{DeviceRegistry, FirmwareStore, SemVer};
use ota_types::{DevicePolicy, DevicePolicyUpdate, MacAddress, ServerConfig};

use crate::cli::DevicePolicyArgs;
use crate::state;

/// Registry and firmware store as configured for this machine.
pub struct DeviceContext {
    registry: DeviceRegistry,
    firmware: FirmwareStore,
    base_url: String,
}

/// Checksum and download URL derived from `--firmware-file`.
struct StagedFirmware {
    checksum: String,
    url: String,
}

impl DeviceContext {
    pub fn new(config: &ServerConfig, data_dir: &Path) -> Self {
        Self {
            registry: state::open_registry(config, data_dir),
            firmware: state::open_firmware_store(config, data_dir),
            base_url: config.base_url(),
        }
    }

    #[cfg(test)]
    pub fn with_parts(registry: DeviceRegistry, firmware: FirmwareStore, base_url: &str) -> Self {
        Self { registry, firmware, base_url: base_url.to_string() }
    }

    pub async fn list_devices(&self, json: bool) -> Result<()> {
        let devices = self.registry.list().await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&devices)?);
            return Ok(());
        }

        if devices.is_empty() {
            println!("{}", "No devices registered.".yellow());
            return Ok(());
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["MAC Address", "Device ID", "Hardware", "Current", "Target", "Last Check"]);

        for (mac, device) in &devices {
            let current = device.current_version.as_deref().unwrap_or("-");
            let current_cell = if is_on_target(current, &device.target_version) {
                Cell::new(current).fg(Color::Green)
            } else if device.current_version.is_some() {
                Cell::new(current).fg(Color::Yellow)
            } else {
                Cell::new(current)
            };
            let last_check = device
                .last_check
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string());

            table.add_row(vec![
                Cell::new(mac),
                Cell::new(&device.device_id),
                Cell::new(&device.hardware_version),
                current_cell,
                Cell::new(&device.target_version),
                Cell::new(last_check),
            ]);
        }

        println!("{table}");
        println!("\n{} devices total", devices.len());
        Ok(())
    }

    pub async fn get_device(&self, mac: &str) -> Result<()> {
        let mac = MacAddress::parse(mac)?;
        let device = self.registry.get(&mac).await?;
        println!("{}", format!("Device {}", mac).cyan().bold());
        println!("{}", serde_json::to_string_pretty(&device)?);
        Ok(())
    }

    pub async fn add_device(&self, mac: &str, version: String, args: DevicePolicyArgs) -> Result<DevicePolicy> {
        let mac = MacAddress::parse(mac)?;
        let staged = self.stage_firmware(args.firmware_file.as_deref()).await?;

        let firmware_url = args
            .firmware_url
            .or_else(|| staged.as_ref().map(|s| s.url.clone()))
            .unwrap_or_default();
        let checksum = args
            .checksum
            .or_else(|| staged.map(|s| s.checksum))
            .unwrap_or_default();
        let device_id = args.device_id.unwrap_or_else(|| format!("device_{}", mac.compact()));

        let mut policy = DevicePolicy::new(device_id, version, firmware_url, checksum);
        if let Some(hw) = args.hardware {
            policy = policy.with_hardware_version(hw);
        }

        self.registry.register(&mac, policy.clone()).await?;
        println!("{} Device added: {}", "✓".green(), mac.to_string().green());
        Ok(policy)
    }

    pub async fn update_device(
        &self,
        mac: &str,
        version: Option<String>,
        args: DevicePolicyArgs,
    ) -> Result<DevicePolicy> {
        let mac = MacAddress::parse(mac)?;
        let staged = self.stage_firmware(args.firmware_file.as_deref()).await?;

        let update = DevicePolicyUpdate {
            device_id: args.device_id,
            hardware_version: args.hardware,
            target_version: version,
            firmware_url: args.firmware_url.or_else(|| staged.as_ref().map(|s| s.url.clone())),
            checksum: args.checksum.or_else(|| staged.map(|s| s.checksum)),
            ..Default::default()
        };
        if update.is_empty() {
            anyhow::bail!("Nothing to update; pass at least one field");
        }

        let device = self.registry.update_fields(&mac, update).await?;
        println!("{} Device updated: {}", "✓".green(), mac.to_string().green());
        Ok(device)
    }

    pub async fn delete_device(&self, mac: &str) -> Result<()> {
        let mac = MacAddress::parse(mac)?;
        if !self.registry.delete(&mac).await? {
            anyhow::bail!("Device not found: {}", mac);
        }
        println!("{} Device deleted: {}", "✓".green(), mac.to_string().green());
        Ok(())
    }

    /// Copy a local firmware file into the firmware directory unless an
    /// identical copy is already there.
    async fn stage_firmware(&self, file: Option<&Path>) -> Result<Option<StagedFirmware>> {
        let Some(file) = file else {
            return Ok(None);
        };

        let filename = file
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid firmware file path: {}", file.display()))?;
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Firmware file not found: {}", file.display()))?;
        let checksum = md5_hex(&bytes);
        println!("Calculated MD5 checksum: {}", checksum);

        let target = self.firmware.path_for(filename)?;
        let up_to_date = match calculate_file_md5(&target).await {
            Ok(existing) => existing == checksum,
            Err(_) => false,
        };
        if !up_to_date {
            self.firmware.save(filename, &bytes).await?;
            println!("Copied firmware file to {}", target.display());
        }

        Ok(Some(StagedFirmware {
            checksum,
            url: download_url(&self.base_url, filename),
        }))
    }
}

/// Reported version equals the target, comparing `1.2` and `1.2.0` as equal.
fn is_on_target(current: &str, target: &str) -> bool {
    match (SemVer::parse(current), SemVer::parse(target)) {
        (Ok(current), Ok(target)) => current == target,
        _ => current == target,
    }
}
