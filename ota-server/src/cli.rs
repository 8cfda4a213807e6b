use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ota-server",
    about = "OTA Update Server - firmware rollout for ESP32 fleets",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, help = "Override the configured listen port")]
    pub port: Option<u16>,

    #[arg(short, long, global = true, help = "Override the configured log level")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the update server (default if no command specified)")]
    Serve,

    #[command(subcommand, about = "Manage registered devices")]
    Device(DeviceCommands),

    #[command(subcommand, about = "View and modify configuration")]
    Config(ConfigCommands),

    #[command(about = "Print the auth token a device with this MAC must send")]
    Token {
        #[arg(help = "Device MAC address")]
        mac: String,
    },

    #[command(about = "Calculate the MD5 checksum of a firmware file")]
    Checksum {
        #[arg(help = "Path to the file")]
        file: PathBuf,
    },

    #[command(about = "Show registry and storage status")]
    Status,

    #[command(about = "Generate a new admin API key")]
    GenerateKey,
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    #[command(about = "List all registered devices")]
    List {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Show one device")]
    Get {
        #[arg(help = "Device MAC address")]
        mac: String,
    },

    #[command(about = "Register a new device")]
    Add {
        #[arg(help = "Device MAC address")]
        mac: String,

        #[arg(long, help = "Target firmware version")]
        version: String,

        #[command(flatten)]
        policy: DevicePolicyArgs,
    },

    #[command(about = "Update a registered device")]
    Update {
        #[arg(help = "Device MAC address")]
        mac: String,

        #[arg(long, help = "Target firmware version")]
        version: Option<String>,

        #[command(flatten)]
        policy: DevicePolicyArgs,
    },

    #[command(about = "Remove a device from the fleet list")]
    Delete {
        #[arg(help = "Device MAC address")]
        mac: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct DevicePolicyArgs {
    #[arg(long, help = "Device ID")]
    pub device_id: Option<String>,

    #[arg(long, help = "Hardware version")]
    pub hardware: Option<String>,

    #[arg(long, help = "URL to the firmware binary")]
    pub firmware_url: Option<String>,

    #[arg(long, help = "Path to the firmware binary (copied into the firmware directory)")]
    pub firmware_file: Option<PathBuf>,

    #[arg(long, help = "MD5 checksum of the firmware")]
    pub checksum: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show current configuration")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Get a specific configuration value")]
    Get {
        #[arg(help = "Configuration key (e.g., 'server_port', 'devices_file')")]
        key: String,
    },

    #[command(about = "Set a configuration value")]
    Set {
        #[arg(help = "Configuration key")]
        key: String,

        #[arg(help = "New value")]
        value: String,
    },
}
