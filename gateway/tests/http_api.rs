//! Router-level tests: the full axum app on an ephemeral port, model
//! services faked, exercised through a real HTTP client.

use async_trait::async_trait;
use embedding::EmbeddingService;
use gateway::processor::MultiModalProcessor;
use gateway::routes;
use gateway::state::AppState;
use inference::{ChatMessage, ChatModel, SpeechToText, VisionCaptioner};
use memory::ConversationMemory;
use rag::RagEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;
use vector_store::InMemoryVectorStore;
use whatsapp::WhatsAppClient;

struct EchoChat;

#[async_trait]
impl ChatModel for EchoChat {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, anyhow::Error> {
        let last = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(format!("echo:{}", last))
    }
}

struct FixedStt;

#[async_trait]
impl SpeechToText for FixedStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, anyhow::Error> {
        Ok("spoken words".to_string())
    }
}

struct FixedVision;

#[async_trait]
impl VisionCaptioner for FixedVision {
    async fn caption(&self, _image: &[u8]) -> Result<String, anyhow::Error> {
        Ok("a lighthouse at dusk".to_string())
    }
}

struct ConstEmbedding;

#[async_trait]
impl EmbeddingService for ConstEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(vec![1.0, 0.5])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        Ok(texts.iter().map(|_| vec![1.0, 0.5]).collect())
    }
}

fn test_state() -> AppState {
    let rag = Arc::new(RagEngine::new(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(ConstEmbedding),
        200,
        40,
        3,
        "test_docs",
    ));
    let memory = ConversationMemory::new(20, chrono::Duration::hours(1));
    let processor = Arc::new(MultiModalProcessor::new(
        Arc::new(EchoChat),
        Arc::new(FixedStt),
        Arc::new(FixedVision),
        rag.clone(),
        memory.clone(),
    ));

    AppState {
        processor,
        rag,
        memory,
        whatsapp: Arc::new(WhatsAppClient::new("token", "42", "test-verify", "v21.0")),
        webhook_permits: Arc::new(Semaphore::new(2)),
    }
}

/// Serves the full router on an ephemeral port and returns its base URL.
async fn spawn_app() -> String {
    let app = routes::router(test_state());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn webhook_verification_echoes_the_challenge() {
    let base = spawn_app().await;

    let response = reqwest::get(format!(
        "{base}/api/v1/webhook/whatsapp\
         ?hub.mode=subscribe&hub.verify_token=test-verify&hub.challenge=abc123"
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "abc123");
}

#[tokio::test]
async fn webhook_verification_rejects_a_wrong_token() {
    let base = spawn_app().await;

    let response = reqwest::get(format!(
        "{base}/api/v1/webhook/whatsapp\
         ?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=abc123"
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn chat_returns_the_full_response_envelope() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/chat"))
        .json(&json!({ "message": "hi", "use_rag": false }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["response"], json!("echo:hi"));
    assert_eq!(body["session_id"], json!("default"));
    assert_eq!(body["message_type"], json!("text"));
    assert!(body["processing_time"].is_number());
}

#[tokio::test]
async fn empty_chat_message_is_a_bad_request() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/chat"))
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], json!("Message must not be empty"));
}

#[tokio::test]
async fn non_pdf_upload_is_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"plain text".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let response = client
        .post(format!("{base}/api/v1/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["detail"],
        json!("Only PDF files are supported. Please upload a .pdf file.")
    );
}

#[tokio::test]
async fn unsupported_audio_type_is_rejected() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "audio",
        reqwest::multipart::Part::bytes(b"RIFF".to_vec())
            .file_name("note.flac")
            .mime_str("audio/flac")
            .unwrap(),
    );
    let response = client
        .post(format!("{base}/api/v1/chat/voice"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Unsupported audio format: audio/flac"));
}

#[tokio::test]
async fn image_upload_flows_through_the_caption_pipeline() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new()
        .part(
            "image",
            reqwest::multipart::Part::bytes(vec![0xff, 0xd8])
                .file_name("photo.jpg")
                .mime_str("image/jpeg")
                .unwrap(),
        )
        .text("session_id", "img-session");
    let response = client
        .post(format!("{base}/api/v1/chat/image"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["response"],
        json!("📸 *Image Analysis:*\n\na lighthouse at dusk")
    );
    assert_eq!(body["session_id"], json!("img-session"));
}

#[tokio::test]
async fn health_reports_store_status_and_session_count() {
    let base = spawn_app().await;

    let response = reqwest::get(format!("{base}/health")).await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["services"]["active_sessions"], json!(0));
    assert_eq!(body["services"]["vector_store"]["status"], json!("connected"));
}

#[tokio::test]
async fn sessions_appear_after_a_chat_and_can_be_cleared() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/api/v1/chat"))
        .json(&json!({ "message": "hi", "session_id": "s-9", "use_rag": false }))
        .send()
        .await
        .unwrap();

    let body: Value = reqwest::get(format!("{base}/api/v1/sessions"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["active_sessions"], json!(["s-9"]));

    let body: Value = client
        .delete(format!("{base}/api/v1/sessions/s-9"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], json!("cleared"));

    let body: Value = client
        .delete(format!("{base}/api/v1/sessions/s-9"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], json!("not_found"));
}

#[tokio::test]
async fn webhook_status_payload_is_acknowledged_without_work() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    // Delivery/read status callbacks carry no messages array.
    let response = client
        .post(format!("{base}/api/v1/webhook/whatsapp"))
        .json(&json!({
            "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "delivered" }] } }] }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("ok"));
}
