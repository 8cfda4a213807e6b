//! OTA Update Server
//!
//! HTTP daemon and operator CLI for ESP32 firmware rollout:
//! - `GET /api/firmware` answers device polls (auth token, target version)
//! - `/firmware/*` serves firmware binaries
//! - `/admin/api/*` manages devices and firmware (admin API key)
//!
//! Device commands (`ota-server device ...`) work on the same registry file.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

mod api;
mod cli;
mod commands;
mod config_commands;
mod device_commands;
mod middleware;
mod router;
mod server_utils;
mod state;
#[cfg(test)]
mod test_helpers;

use cli::{Cli, Commands};
use ota_core::modules::{config as core_config, logger, paths};
use ota_types::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = core_config::load_config()?;
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    logger::init_logger(cli.log_level.as_deref().unwrap_or(&config.log_level));

    match cli.command {
        None | Some(Commands::Serve) => run_server(config).await,
        Some(Commands::Device(cmd)) => commands::handle_device_command(cmd, &config).await,
        Some(Commands::Config(cmd)) => commands::handle_config_command(cmd).await,
        Some(Commands::Token { mac }) => commands::handle_token(&mac, &config),
        Some(Commands::Checksum { file }) => commands::handle_checksum(&file).await,
        Some(Commands::Status) => commands::handle_status(&config).await,
        Some(Commands::GenerateKey) => commands::handle_generate_key().await,
    }
}

async fn run_server(config: ServerConfig) -> Result<()> {
    config.validate()?;
    for field in config.default_credentials() {
        warn!("{} is still set to its shipped default; change it before deploying", field);
    }

    let data_dir = paths::get_data_dir()?;
    let state = AppState::from_config(config, &data_dir);
    state.firmware().ensure_dir().await?;

    let device_count = state.registry().len().await?;
    info!("{} devices registered", device_count);
    info!("Firmware directory: {}", state.firmware().dir().display());

    let listener = server_utils::create_listener(state.config()).await?;
    let addr = listener.local_addr()?;

    info!("OTA server listening on http://{}", addr);
    info!("Device endpoint at http://{}/api/firmware", addr);
    info!("Admin API at http://{}/admin/api/", addr);

    let app = router::build_router(state);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            server_utils::shutdown_signal().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
