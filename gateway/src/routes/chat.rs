//! Chat and upload endpoints (the non-WhatsApp surface).

use crate::error::ApiError;
use crate::processor::ChatResponse;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

const ALLOWED_AUDIO_TYPES: [&str; 5] = [
    "audio/ogg",
    "audio/mpeg",
    "audio/wav",
    "audio/mp4",
    "audio/webm",
];

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session")]
    pub session_id: String,
    #[serde(default = "default_true")]
    pub use_rag: bool,
}

fn default_session() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// One file field pulled out of a multipart body.
struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// `POST /api/v1/chat` — direct text chat with optional RAG augmentation.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message must not be empty".to_string()));
    }

    let response = state
        .processor
        .process_text(&request.message, &request.session_id, request.use_rag)
        .await?;
    Ok(Json(response))
}

/// `POST /api/v1/upload` — ingest a PDF into the knowledge base.
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (file, _) = read_file_form(multipart, "file").await?;
    let file = file.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;

    let filename = file
        .filename
        .ok_or_else(|| ApiError::BadRequest("Uploaded file has no filename".to_string()))?;
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest(
            "Only PDF files are supported. Please upload a .pdf file.".to_string(),
        ));
    }

    let chunks = state.rag.ingest_pdf(&file.data, &filename).await?;

    Ok(Json(json!({
        "filename": filename,
        "chunks_created": chunks,
        "status": "completed",
        "message": format!("Successfully ingested {} ({} chunks created)", filename, chunks),
    })))
}

/// `POST /api/v1/chat/voice` — transcribe an uploaded audio file and answer.
pub async fn chat_voice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let (audio, fields) = read_file_form(multipart, "audio").await?;
    let audio = audio.ok_or_else(|| ApiError::BadRequest("Missing audio field".to_string()))?;

    if let Some(content_type) = &audio.content_type {
        if !ALLOWED_AUDIO_TYPES.contains(&content_type.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported audio format: {}. Supported: {:?}",
                content_type, ALLOWED_AUDIO_TYPES
            )));
        }
    }

    let session_id = fields.session_id.unwrap_or_else(default_session);
    let response = state.processor.process_voice(&audio.data, &session_id).await?;
    Ok(Json(response))
}

/// `POST /api/v1/chat/image` — caption an uploaded image, optionally
/// answering a question about it.
pub async fn chat_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let (image, fields) = read_file_form(multipart, "image").await?;
    let image = image.ok_or_else(|| ApiError::BadRequest("Missing image field".to_string()))?;

    if let Some(content_type) = &image.content_type {
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported image format: {}. Supported: {:?}",
                content_type, ALLOWED_IMAGE_TYPES
            )));
        }
    }

    let session_id = fields.session_id.unwrap_or_else(default_session);
    let caption = fields.caption.filter(|c| !c.trim().is_empty());
    let response = state
        .processor
        .process_image(&image.data, &session_id, caption.as_deref())
        .await?;
    Ok(Json(response))
}

#[derive(Default)]
struct FormFields {
    session_id: Option<String>,
    caption: Option<String>,
}

/// Drains a multipart body, returning the file stored under `file_field`
/// plus the recognized text fields.
async fn read_file_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(Option<UploadedFile>, FormFields), ApiError> {
    let mut file = None;
    let mut fields = FormFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?
                .to_vec();
            file = Some(UploadedFile {
                filename,
                content_type,
                data,
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            match name.as_str() {
                "session_id" => fields.session_id = Some(text),
                "caption" => fields.caption = Some(text),
                _ => {}
            }
        }
    }

    Ok((file, fields))
}
