//! Path utilities for server data storage.

use std::fs;
use std::path::{Path, PathBuf};

use ota_types::ConfigError;

/// Directory name for data storage.
pub const DATA_DIR: &str = ".ota_server";
/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "OTA_SERVER_DATA_DIR";

/// Get the data directory path, creating it if needed.
///
/// Priority:
/// 1. `OTA_SERVER_DATA_DIR` environment variable (for container deployments)
/// 2. `~/.ota_server`
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = if let Ok(custom_dir) = std::env::var(DATA_DIR_ENV) {
        PathBuf::from(custom_dir)
    } else {
        let home = dirs::home_dir().ok_or_else(|| ConfigError::NotFound {
            path: "home directory".to_string(),
        })?;
        home.join(DATA_DIR)
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(|e| ConfigError::from_io_error(&e))?;
    }

    Ok(data_dir)
}

/// Resolve a configured path against the data directory unless it is absolute.
pub fn resolve(data_dir: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}
