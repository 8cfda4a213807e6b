//! Server configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shipped default for the fleet secret. Must be replaced in production.
pub const DEFAULT_SHARED_SECRET: &str = "change-this-key-in-production";
/// Shipped default for the admin key. Must be replaced in production.
pub const DEFAULT_ADMIN_API_KEY: &str = "change-admin-api-key-in-production";

/// Full server configuration.
///
/// `shared_secret_key` must equal the constant compiled into every device
/// firmware image. Changing it here without reflashing the fleet makes every
/// device fail authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Fleet-wide secret used for device token derivation
    #[serde(default = "default_shared_secret")]
    pub shared_secret_key: String,
    /// Static credential for the admin API
    #[serde(default = "default_admin_api_key")]
    pub admin_api_key: String,
    /// Bind address
    #[serde(default = "default_server_host")]
    pub server_host: String,
    /// Bind port
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// Log level (`RUST_LOG` takes precedence)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Device registry file, relative to the data directory unless absolute
    #[serde(default = "default_devices_file")]
    pub devices_file: String,
    /// Firmware directory, relative to the data directory unless absolute
    #[serde(default = "default_firmware_directory")]
    pub firmware_directory: String,
    /// Base URL used when handing out firmware download links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

fn default_shared_secret() -> String {
    DEFAULT_SHARED_SECRET.to_string()
}

fn default_admin_api_key() -> String {
    DEFAULT_ADMIN_API_KEY.to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_server_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_devices_file() -> String {
    "devices.json".to_string()
}

fn default_firmware_directory() -> String {
    "firmware".to_string()
}

impl ServerConfig {
    /// Create default configuration.
    pub fn new() -> Self {
        Self {
            shared_secret_key: default_shared_secret(),
            admin_api_key: default_admin_api_key(),
            server_host: default_server_host(),
            server_port: default_server_port(),
            log_level: default_log_level(),
            devices_file: default_devices_file(),
            firmware_directory: default_firmware_directory(),
            public_base_url: None,
        }
    }

    /// Base URL for firmware download links, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.server_port == 80 => format!("http://{}", self.server_host),
            None => format!("http://{}:{}", self.server_host, self.server_port),
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared_secret_key.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "shared_secret_key".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.admin_api_key.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "admin_api_key".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.devices_file.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "devices_file".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Names of credentials still set to their shipped defaults.
    pub fn default_credentials(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.shared_secret_key == DEFAULT_SHARED_SECRET {
            fields.push("shared_secret_key");
        }
        if self.admin_api_key == DEFAULT_ADMIN_API_KEY {
            fields.push("admin_api_key");
        }
        fields
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
