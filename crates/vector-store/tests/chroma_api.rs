//! ChromaStore against a local stub of the Chroma REST API.
//!
//! The stub records every collection operation it receives, so the tests can
//! assert both the request bodies the adapter sends and how it unpacks the
//! nested query response.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use vector_store::{ChromaStore, DocumentChunk, VectorStore};

/// Pairs of (operation name, request body) in arrival order.
type OpLog = Arc<Mutex<Vec<(String, Value)>>>;

async fn collection_op(
    State((log, query_response)): State<(OpLog, Value)>,
    Path((_collection, op)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    log.lock().await.push((op.clone(), body));
    if op == "query" {
        Json(query_response)
    } else {
        Json(json!({}))
    }
}

/// Serves a Chroma REST stub on an ephemeral port; returns the base URL to
/// hand to [`ChromaStore::with_base_url`].
async fn spawn_stub(log: OpLog, query_response: Value) -> String {
    let app = Router::new()
        .route(
            "/api/v1/collections",
            post(|| async { Json(json!({ "id": "col-7", "name": "docs" })) }),
        )
        .route("/api/v1/collections/{collection}/count", get(|| async { Json(json!(3)) }))
        .route("/api/v1/collections/{collection}/{op}", post(collection_op))
        .with_state((log, query_response));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

fn chunk(id: &str, text: &str, source: &str, index: usize) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        text: text.to_string(),
        source: source.to_string(),
        chunk_index: index,
        total_chunks: 2,
        extra: Default::default(),
    }
}

#[tokio::test]
async fn upsert_sends_ids_documents_metadatas_and_embeddings() {
    let log: OpLog = Default::default();
    let base = spawn_stub(log.clone(), json!({})).await;
    let store = ChromaStore::with_base_url(base, "docs");

    store
        .upsert(
            &[
                chunk("f1_chunk_0", "first part", "a.pdf", 0),
                chunk("f1_chunk_1", "second part", "a.pdf", 1),
            ],
            &[vec![0.5, 0.25], vec![1.0, 0.0]],
        )
        .await
        .unwrap();

    let log = log.lock().await;
    assert_eq!(log.len(), 1);
    let (op, body) = &log[0];
    assert_eq!(op, "upsert");
    assert_eq!(body["ids"], json!(["f1_chunk_0", "f1_chunk_1"]));
    assert_eq!(body["documents"], json!(["first part", "second part"]));
    assert_eq!(body["embeddings"], json!([[0.5, 0.25], [1.0, 0.0]]));
    assert_eq!(body["metadatas"][0]["source"], json!("a.pdf"));
    assert_eq!(body["metadatas"][1]["chunk_index"], json!(1));
    assert_eq!(body["metadatas"][0]["total_chunks"], json!(2));
}

#[tokio::test]
async fn query_unpacks_nested_response_with_metadata_fallbacks() {
    let log: OpLog = Default::default();
    let base = spawn_stub(
        log.clone(),
        json!({
            "documents": [["closest text", "further text"]],
            "metadatas": [[
                { "source": "a.pdf", "chunk_index": 4 },
                {},  // missing metadata falls back, not errors
            ]],
            "distances": [[0.125, 0.75]],
        }),
    )
    .await;
    let store = ChromaStore::with_base_url(base, "docs");

    let hits = store.query(&[1.0, 0.0], 2).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "closest text");
    assert_eq!(hits[0].source, "a.pdf");
    assert_eq!(hits[0].chunk_index, 4);
    assert!((hits[0].distance - 0.125).abs() < 1e-6);
    assert_eq!(hits[1].source, "unknown");
    assert_eq!(hits[1].chunk_index, 0);

    let log = log.lock().await;
    let (op, body) = &log[0];
    assert_eq!(op, "query");
    assert_eq!(body["n_results"], json!(2));
    assert_eq!(body["query_embeddings"], json!([[1.0, 0.0]]));
}

#[tokio::test]
async fn empty_query_response_yields_no_hits() {
    let base = spawn_stub(
        Default::default(),
        json!({ "documents": [], "metadatas": [], "distances": [] }),
    )
    .await;
    let store = ChromaStore::with_base_url(base, "docs");

    let hits = store.query(&[1.0], 5).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn delete_by_source_sends_a_where_filter() {
    let log: OpLog = Default::default();
    let base = spawn_stub(log.clone(), json!({})).await;
    let store = ChromaStore::with_base_url(base, "docs");

    store.delete_by_source("a.pdf").await.unwrap();

    let log = log.lock().await;
    let (op, body) = &log[0];
    assert_eq!(op, "delete");
    assert_eq!(body["where"], json!({ "source": "a.pdf" }));
}

#[tokio::test]
async fn count_reads_the_collection_count() {
    let base = spawn_stub(Default::default(), json!({})).await;
    let store = ChromaStore::with_base_url(base, "docs");

    assert_eq!(store.count().await.unwrap(), 3);
}
