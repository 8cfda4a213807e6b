use axum::{
    extract::{Multipart, Path, State},
    response::Json,
};

use ota_core::modules::firmware::download_url;
use ota_types::{FirmwareFile, FirmwareUploadResponse};

use super::devices::SuccessResponse;
use super::error::ApiError;
use crate::state::AppState;

pub async fn list_firmware(State(state): State<AppState>) -> Result<Json<Vec<FirmwareFile>>, ApiError> {
    Ok(Json(state.firmware().list().await?))
}

pub async fn upload_firmware(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FirmwareUploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::bad_request("No file selected"))?;
        let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;

        let stored = state.firmware().save(&filename, &bytes).await?;
        let url = download_url(&state.config().base_url(), &stored.filename);

        return Ok(Json(FirmwareUploadResponse {
            filename: stored.filename,
            checksum: stored.checksum,
            size: stored.size,
            success: true,
            url: Some(url),
        }));
    }

    Err(ApiError::bad_request("No file part"))
}

pub async fn firmware_info(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<FirmwareFile>, ApiError> {
    Ok(Json(state.firmware().info(&filename).await?))
}

pub async fn delete_firmware(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.firmware().delete(&filename).await?;
    Ok(Json(SuccessResponse { success: true }))
}
