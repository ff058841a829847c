use axum::{
    extract::{multipart::Field, Multipart, State},
    response::IntoResponse,
    Json,
};

use crate::error::Result;
use crate::models::UploadedDocument;
use crate::services::evaluation_service::EvaluationInput;
use crate::AppState;

/// Multipart field names, matching the public form contract:
/// repeated `student_answer_scripts` files, optional
/// `type_answer_key_text` text and `upload_answer_key_file` file.
#[utoipa::path(
    post,
    path = "/mcq/evaluate",
    responses(
        (status = 200, description = "Evaluation report, or an {\"error\": ...} body for request-level failures", body = Json<serde_json::Value>),
        (status = 400, description = "Malformed multipart body"),
    ),
)]
pub async fn evaluate_mcq(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut input = EvaluationInput::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        crate::error::Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "type_answer_key_text" => {
                let text = field.text().await.unwrap_or_default();
                if !text.trim().is_empty() {
                    input.answer_key_text = Some(text);
                }
            }
            "upload_answer_key_file" => {
                if let Some(doc) = read_document(field).await? {
                    input.answer_key_file = Some(doc);
                }
            }
            "student_answer_scripts" => {
                if let Some(doc) = read_document(field).await? {
                    input.student_scripts.push(doc);
                }
            }
            other => {
                tracing::warn!("Ignoring unknown multipart field '{}'", other);
            }
        }
    }

    tracing::info!(
        "Evaluation request: {} scripts, key_text={}, key_file={}",
        input.student_scripts.len(),
        input.answer_key_text.is_some(),
        input.answer_key_file.is_some()
    );

    let outcome = state.evaluation_service.evaluate(input).await;
    Ok(Json(outcome))
}

/// Reads one file field into an `UploadedDocument`. A field with no
/// filename and no content is a browser's "nothing selected" and maps
/// to `None`; actual content is kept even when tiny so the validation
/// layer can name the offending file.
async fn read_document(field: Field<'_>) -> Result<Option<UploadedDocument>> {
    let filename = field
        .file_name()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty());
    let media_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field.bytes().await.map_err(|e| {
        tracing::error!("Failed to read upload bytes: {}", e);
        crate::error::Error::BadRequest("Failed to read file upload".into())
    })?;

    match filename {
        None if data.is_empty() => Ok(None),
        filename => Ok(Some(UploadedDocument::new(
            filename.unwrap_or_else(|| "upload.bin".to_string()),
            media_type,
            data,
        ))),
    }
}
