use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use tokio::fs;

use crate::dto::mcq_dto::UploadSheetResponse;
use crate::error::Result;
use crate::models::UploadedDocument;
use crate::AppState;

/// Writes a validated sheet under the uploads directory using a
/// UUID-based name; the extension comes from the declared media type,
/// so the client-supplied filename never reaches the filesystem.
async fn store_sheet(uploads_dir: &str, sheet: &UploadedDocument) -> Result<String> {
    let ext = match sheet.extension() {
        Some(ext) => ext,
        None => {
            return Err(crate::error::Error::BadRequest(format!(
                "The file '{}' is not supported. Only PDF, JPG, and PNG are allowed.",
                sheet.filename
            )))
        }
    };

    fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| crate::error::Error::Internal(e.to_string()))?;

    let file_path = format!("{}/{}.{}", uploads_dir, uuid::Uuid::new_v4(), ext);
    fs::write(&file_path, &sheet.bytes).await.map_err(|e| {
        tracing::error!("Failed to write sheet file: {}", e);
        crate::error::Error::Internal(format!("Failed to save file: {}", e))
    })?;

    Ok(file_path)
}

#[utoipa::path(
    post,
    path = "/sheets/upload",
    responses(
        (status = 200, description = "Sheet stored on disk", body = Json<UploadSheetResponse>),
        (status = 400, description = "Missing file field, unsupported media type, or empty upload"),
    ),
)]
pub async fn upload_sheet(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        crate::error::Error::BadRequest(e.to_string())
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("sheet.bin").to_string();
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read sheet bytes: {}", e);
            crate::error::Error::BadRequest("Failed to read file upload".into())
        })?;

        let sheet = UploadedDocument::new(filename, media_type, data);
        if sheet.is_near_empty() {
            return Err(crate::error::Error::BadRequest(format!(
                "The file '{}' appears to be empty or corrupted. Please upload a valid image or PDF.",
                sheet.filename
            )));
        }

        let path = store_sheet(&state.uploads_dir, &sheet).await?;
        tracing::info!("Stored answer sheet '{}' at {}", sheet.filename, path);

        return Ok(Json(UploadSheetResponse {
            filename: sheet.filename,
            message: "Upload successful".to_string(),
            path,
            uploaded_at: chrono::Utc::now(),
        }));
    }

    Err(crate::error::Error::BadRequest(
        "No file field in upload".into(),
    ))
}
