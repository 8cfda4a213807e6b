use anyhow::Result;
use colored::Colorize;

use ota_core::modules::config as core_config;
use ota_types::ServerConfig;

pub fn show_config(json: bool) -> Result<()> {
    let config = core_config::load_config()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", "Server Configuration:".cyan().bold());
        println!("  Listen: {}:{}", config.server_host, config.server_port);
        println!("  Base URL: {}", config.base_url());
        println!("  Log Level: {}", config.log_level);
        println!("  Devices File: {}", config.devices_file);
        println!("  Firmware Directory: {}", config.firmware_directory);
        println!("  Shared Secret: {}", mask_key(&config.shared_secret_key));
        println!("  Admin API Key: {}", mask_key(&config.admin_api_key));
    }
    Ok(())
}

pub fn get_config_value(key: &str) -> Result<()> {
    let config = core_config::load_config()?;
    println!("{}", config_value(&config, key)?);
    Ok(())
}

pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    apply_config_value(&mut ServerConfig::new(), key, value)?;

    let mut outcome = Ok(());
    core_config::update_config(|config| {
        outcome = apply_config_value(config, key, value);
    })?;
    outcome?;

    if key == "shared_secret_key" {
        println!(
            "{} Every device must be reflashed with the new secret or it will fail authentication",
            "!".yellow()
        );
    }
    println!("{} Config updated: {} = {}", "✓".green(), key, value);
    Ok(())
}

fn config_value(config: &ServerConfig, key: &str) -> Result<String> {
    let value = match key {
        "shared_secret_key" => config.shared_secret_key.clone(),
        "admin_api_key" => config.admin_api_key.clone(),
        "server_host" => config.server_host.clone(),
        "server_port" => config.server_port.to_string(),
        "log_level" => config.log_level.clone(),
        "devices_file" => config.devices_file.clone(),
        "firmware_directory" => config.firmware_directory.clone(),
        "public_base_url" => config.public_base_url.clone().unwrap_or_default(),
        _ => anyhow::bail!("Unknown config key: {}", key),
    };
    Ok(value)
}

fn apply_config_value(config: &mut ServerConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "shared_secret_key" => config.shared_secret_key = value.to_string(),
        "admin_api_key" => config.admin_api_key = value.to_string(),
        "server_host" => {
            value
                .parse::<std::net::IpAddr>()
                .map_err(|_| anyhow::anyhow!("Invalid bind address: {}", value))?;
            config.server_host = value.to_string();
        }
        "server_port" => {
            config.server_port =
                value.parse().map_err(|_| anyhow::anyhow!("Invalid port number: {}", value))?;
        }
        "log_level" => config.log_level = value.to_string(),
        "devices_file" => config.devices_file = value.to_string(),
        "firmware_directory" => config.firmware_directory = value.to_string(),
        "public_base_url" => {
            config.public_base_url = Some(value.to_string()).filter(|v| !v.is_empty());
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
