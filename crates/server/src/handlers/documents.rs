//! # Document Upload Handler

use super::{AppError, AppState};
use crate::types::UploadResponse;
use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use leadrag::types::UploadedFile;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// The handler for `POST /documents/upload`.
///
/// Expects the multipart fields `user_id`, `file` and an optional `metadata`
/// JSON object that is attached to every stored chunk.
pub async fn upload_document_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut user_id: Option<String> = None;
    let mut file: Option<UploadedFile> = None;
    let mut raw_metadata: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "user_id" => {
                user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some(UploadedFile::new(filename, content_type, bytes.to_vec()));
            }
            "metadata" => {
                raw_metadata = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            _ => warn!("Ignoring unknown multipart field: {}", name),
        }
    }

    let user_id = user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("user_id is required".to_string()))?;
    let file = file
        .filter(|f| !f.filename.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("No file selected".to_string()))?;
    let metadata = parse_metadata(raw_metadata.as_deref())?;

    info!(%user_id, filename = %file.filename, bytes = file.bytes.len(), "Document upload received");
    let filename = file.filename.clone();
    let chunks = app_state.ingestion.ingest(&user_id, file, metadata).await?;
    info!(%filename, chunks, "Document uploaded");

    Ok(Json(UploadResponse {
        status: "success".to_string(),
        filename,
        chunks,
    }))
}

/// Parses the `metadata` field. A missing or blank field means no metadata.
fn parse_metadata(raw: Option<&str>) -> Result<Map<String, Value>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::BadRequest(
            "metadata must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::BadRequest(format!(
            "Invalid JSON in metadata: {e}"
        ))),
    }
}
