use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use ota_core::modules::{config as core_config, firmware, paths};
use ota_core::{derive_token, SharedSecret};
use ota_types::{MacAddress, ServerConfig};

use crate::cli::{ConfigCommands, DeviceCommands};
use crate::{config_commands, device_commands, state};

pub async fn handle_device_command(cmd: DeviceCommands, config: &ServerConfig) -> Result<()> {
    let data_dir = paths::get_data_dir()?;
    let ctx = device_commands::DeviceContext::new(config, &data_dir);

    match cmd {
        DeviceCommands::List { json } => ctx.list_devices(json).await,
        DeviceCommands::Get { mac } => ctx.get_device(&mac).await,
        DeviceCommands::Add { mac, version, policy } => {
            ctx.add_device(&mac, version, policy).await.map(|_| ())
        }
        DeviceCommands::Update { mac, version, policy } => {
            ctx.update_device(&mac, version, policy).await.map(|_| ())
        }
        DeviceCommands::Delete { mac } => ctx.delete_device(&mac).await,
    }
}

pub async fn handle_config_command(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json } => config_commands::show_config(json),
        ConfigCommands::Get { key } => config_commands::get_config_value(&key),
        ConfigCommands::Set { key, value } => config_commands::set_config_value(&key, &value),
    }
}

pub fn handle_token(mac: &str, config: &ServerConfig) -> Result<()> {
    let mac = MacAddress::parse(mac)?;
    let token = derive_token(&mac, &SharedSecret::new(config.shared_secret_key.clone()));
    if !token.is_valid() {
        anyhow::bail!("shared_secret_key is empty; cannot derive a token");
    }
    println!("{}", token);
    Ok(())
}

pub async fn handle_checksum(file: &Path) -> Result<()> {
    let checksum = firmware::calculate_file_md5(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    println!("File: {}", file.display());
    println!("MD5 Checksum: {}", checksum);
    Ok(())
}

pub async fn handle_status(config: &ServerConfig) -> Result<()> {
    let data_dir = paths::get_data_dir()?;
    let registry = state::open_registry(config, &data_dir);
    let store = state::open_firmware_store(config, &data_dir);

    let devices = registry.list().await?;
    let outdated = devices
        .values()
        .filter(|d| d.current_version.as_deref().is_some_and(|v| v != d.target_version))
        .count();
    let firmware_count = store.list().await.map(|files| files.len()).unwrap_or(0);

    println!("{}", "OTA Server Status".cyan().bold());
    println!("  Devices: {} registered, {} not on target", devices.len(), outdated);
    println!("  Firmware files: {}", firmware_count);
    println!("  Data dir: {}", data_dir.display());
    println!("  Listen: {}:{}", config.server_host, config.server_port);
    println!("  Version: {}", env!("CARGO_PKG_VERSION"));

    for field in config.default_credentials() {
        println!("  {} {} uses the shipped default", "!".yellow(), field);
    }
    Ok(())
}

pub async fn handle_generate_key() -> Result<()> {
    use rand::Rng;

    let api_key: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    core_config::update_config(|config| {
        config.admin_api_key = api_key.clone();
    })?;

    println!("{} New admin API key generated: {}", "✓".green(), api_key);
    Ok(())
}
