//! Server configuration: `config.json` in the data directory, then
//! `OTA_SERVER_<FIELD>` environment overrides.

use std::fs;
use std::path::Path;

use ota_types::{ConfigError, ServerConfig};

use super::paths::get_data_dir;

const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "OTA_SERVER_";

/// Load configuration from the data directory and the process environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    let data_dir = get_data_dir()?;
    let mut config = load_config_file(&data_dir)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Load `config.json` from `dir` without environment overrides.
pub fn load_config_file(dir: &Path) -> Result<ServerConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
        return Ok(ServerConfig::new());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::ParseError {
        message: format!("Failed to read {}: {}", config_path.display(), e),
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))
}

/// Override fields from `OTA_SERVER_<FIELD>` variables.
///
/// `lookup` is `std::env::var` in production and a map in tests.
pub fn apply_env_overrides<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |field: &str| {
        lookup(&format!("{}{}", ENV_PREFIX, field.to_ascii_uppercase()))
            .map(|v| v.trim().to_string())
            .map(|v| {
                tracing::info!("Overriding {} from environment variable", field);
                v
            })
    };

    if let Some(v) = get("shared_secret_key") {
        config.shared_secret_key = v;
    }
    if let Some(v) = get("admin_api_key") {
        config.admin_api_key = v;
    }
    if let Some(v) = get("server_host") {
        config.server_host = v;
    }
    if let Some(v) = get("server_port") {
        config.server_port = v.parse().map_err(|_| ConfigError::ValidationError {
            field: "server_port".to_string(),
            message: format!("'{}' is not a valid port", v),
        })?;
    }
    if let Some(v) = get("log_level") {
        config.log_level = v;
    }
    if let Some(v) = get("devices_file") {
        config.devices_file = v;
    }
    if let Some(v) = get("firmware_dir") {
        config.firmware_directory = v;
    }
    if let Some(v) = get("public_base_url") {
        config.public_base_url = Some(v).filter(|v| !v.is_empty());
    }

    Ok(())
}

/// Save configuration atomically.
pub fn save_config(config: &ServerConfig) -> Result<(), ConfigError> {
    save_config_file(&get_data_dir()?, config)
}

pub fn save_config_file(dir: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    let temp_path = dir.join(format!("{}.tmp", CONFIG_FILE));

    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::from_json_error(&e))?;

    fs::write(&temp_path, content).map_err(|e| ConfigError::from_io_error(&e))?;
    fs::rename(&temp_path, &config_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ConfigError::from_io_error(&e)
    })
}

/// Update specific fields in the stored config file.
///
/// Environment overrides are not written back.
pub fn update_config<F>(updater: F) -> Result<ServerConfig, ConfigError>
where
    F: FnOnce(&mut ServerConfig),
{
    let data_dir = get_data_dir()?;
    let mut config = load_config_file(&data_dir)?;
    updater(&mut config);
    config.validate()?;
    save_config_file(&data_dir, &config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(load_config_file(tmp.path()).unwrap(), ServerConfig::new());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = ServerConfig::new();
        config.shared_secret_key = "fleet-secret".to_string();
        config.server_port = 8443;
        save_config_file(tmp.path(), &config).unwrap();

        assert_eq!(load_config_file(tmp.path()).unwrap(), config);
        assert!(!tmp.path().join("config.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "{").unwrap();
        assert!(matches!(load_config_file(tmp.path()), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OTA_SERVER_SHARED_SECRET_KEY", " from-env "),
            ("OTA_SERVER_SERVER_PORT", "9000"),
            ("OTA_SERVER_FIRMWARE_DIR", "/srv/firmware"),
        ]);
        let mut config = ServerConfig::new();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.shared_secret_key, "from-env");
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.firmware_directory, "/srv/firmware");
        assert_eq!(config.admin_api_key, ServerConfig::new().admin_api_key);
    }

    #[test]
    fn test_env_override_bad_port() {
        let mut config = ServerConfig::new();
        let err = apply_env_overrides(&mut config, |k| {
            (k == "OTA_SERVER_SERVER_PORT").then(|| "eighty".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
