//! API Routes
//!
//! Public device endpoints plus the key-protected admin API.

mod devices;
pub mod error;
mod firmware;
pub mod update_check;

#[cfg(test)]
mod update_check_tests;

use axum::{
    response::{IntoResponse, Json},
    routing::{delete, get},
    Router,
};
use serde::Serialize;

use crate::state::AppState;
use error::ApiError;

pub use update_check::check_firmware_update;

/// Routes mounted under `/admin/api`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        // Devices
        .route("/devices", get(devices::list_devices).post(devices::add_device))
        .route(
            "/devices/:mac",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        // Firmware
        .route("/firmware", get(firmware::list_firmware).post(firmware::upload_firmware))
        .route("/firmware/:filename", delete(firmware::delete_firmware))
        .route("/firmware/:filename/info", get(firmware::firmware_info))
        .fallback(not_found)
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

pub async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
