use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use ota_core::modules::registry::DeviceMap;
use ota_types::{DevicePolicy, DevicePolicyUpdate, MacAddress};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDeviceRequest {
    pub mac_address: String,
    pub device_id: String,
    #[serde(default)]
    pub hardware_version: Option<String>,
    pub target_version: String,
    pub firmware_url: String,
    pub checksum: String,
}

/// Operator-editable policy fields. Observations are owned by the poll path.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDeviceRequest {
    pub device_id: Option<String>,
    pub hardware_version: Option<String>,
    pub target_version: Option<String>,
    pub firmware_url: Option<String>,
    pub checksum: Option<String>,
}

impl From<UpdateDeviceRequest> for DevicePolicyUpdate {
    fn from(req: UpdateDeviceRequest) -> Self {
        Self {
            device_id: req.device_id,
            hardware_version: req.hardware_version,
            target_version: req.target_version,
            firmware_url: req.firmware_url,
            checksum: req.checksum,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateDeviceResponse {
    pub success: bool,
    pub mac_address: MacAddress,
    pub device: DevicePolicy,
}

#[derive(Debug, Serialize)]
pub struct UpdateDeviceResponse {
    pub success: bool,
    pub device: DevicePolicy,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

fn parse_mac(raw: &str) -> Result<MacAddress, ApiError> {
    MacAddress::parse(raw).map_err(ApiError::from)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v).map_err(|e| ApiError::bad_request(e.body_text()))
}

pub async fn list_devices(State(state): State<AppState>) -> Result<Json<DeviceMap>, ApiError> {
    Ok(Json(state.registry().list().await?))
}

pub async fn get_device(
    State(state): State<AppState>,
    Path(mac): Path<String>,
) -> Result<Json<DevicePolicy>, ApiError> {
    let mac = parse_mac(&mac)?;
    Ok(Json(state.registry().get(&mac).await?))
}

pub async fn add_device(
    State(state): State<AppState>,
    body: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateDeviceResponse>), ApiError> {
    let req = json_body(body)?;
    let mac = parse_mac(&req.mac_address)?;

    let mut policy = DevicePolicy::new(req.device_id, req.target_version, req.firmware_url, req.checksum);
    if let Some(hw) = req.hardware_version {
        policy = policy.with_hardware_version(hw);
    }

    state.registry().register(&mac, policy.clone()).await?;
    tracing::info!(mac = %mac, "Device added via admin API");

    Ok((
        StatusCode::CREATED,
        Json(CreateDeviceResponse { success: true, mac_address: mac, device: policy }),
    ))
}

pub async fn update_device(
    State(state): State<AppState>,
    Path(mac): Path<String>,
    body: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> Result<Json<UpdateDeviceResponse>, ApiError> {
    let mac = parse_mac(&mac)?;
    let update = DevicePolicyUpdate::from(json_body(body)?);
    if update.is_empty() {
        return Err(ApiError::bad_request("No data provided"));
    }

    let device = state.registry().update_fields(&mac, update).await?;
    tracing::info!(mac = %mac, "Device updated via admin API");

    Ok(Json(UpdateDeviceResponse { success: true, device }))
}

pub async fn delete_device(
    State(state): State<AppState>,
    Path(mac): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let mac = parse_mac(&mac)?;
    if !state.registry().delete(&mac).await? {
        return Err(ApiError::not_found(format!("Device not found: {}", mac)));
    }
    tracing::info!(mac = %mac, "Device deleted via admin API");
    Ok(Json(SuccessResponse { success: true }))
}
