//! Device poll endpoint: `GET /api/firmware`.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;

use ota_core::UpdateCheckRequest;
use ota_types::UpdateCheckResponse;

use super::error::ApiError;
use crate::state::AppState;

pub const DEVICE_AUTH_HEADER: &str = "x-device-auth";

/// Query parameters sent by the device. All optional here so that a missing
/// one is reported as a JSON 400 by the engine, not as an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCheckQuery {
    pub device_id: Option<String>,
    pub hardware: Option<String>,
    pub version: Option<String>,
    pub mac: Option<String>,
}

pub async fn check_firmware_update(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(query): Query<UpdateCheckQuery>,
) -> Result<Json<UpdateCheckResponse>, ApiError> {
    let auth_token = headers
        .get(DEVICE_AUTH_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let source_address = extract_client_ip(&headers)
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()));

    let request = UpdateCheckRequest {
        device_id: query.device_id.unwrap_or_default(),
        hardware: query.hardware.unwrap_or_default(),
        version: query.version.unwrap_or_default(),
        mac: query.mac.unwrap_or_default(),
        auth_token,
        source_address,
    };

    let response = state.engine().check(request).await?;
    Ok(Json(response))
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
}
