//! Integration tests for the Foundry embedding service.
//!
//! These tests exercise [`foundry_embedding::FoundryEmbedding`] against a local `mockito`
//! server standing in for the model deployment, and end to end through
//! [`embedding::EmbeddingGenerator`]. The test that calls a real deployment is marked
//! `#[ignore]`.
//!
//! # Running tests
//!
//! - **Default (no deployment):** `cargo test -p foundry-embedding`.
//! - **With deployment:** `cargo test -p foundry-embedding -- --ignored`; set `EMBEDDING_ENDPOINT`,
//!   `EMBEDDING_KEY` and `EMBEDDING_MODEL` (e.g. in repo root `.env`).

use std::path::Path;
use std::sync::Arc;

use chunking::LineChunking;
use embedding::{
    EmbeddingError, EmbeddingGenerator, EmbeddingService, ModelDeploymentConfig, Usage,
};
use foundry_embedding::{FoundryEmbedding, MISSING_USAGE_TOKENS};
use mockito::Matcher;
use serde_json::json;

const MODEL: &str = "embed-test";

/// Loads `.env` from the workspace root so deployment settings are available in ignored tests.
/// Path: `crates/embedding/foundry-embedding` → `../../../.env` = repo root.
fn load_root_env() {
    let root_env = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../.env");
    let _ = dotenvy::from_path(root_env);
}

fn embedding_body(vector: &[f32], total_tokens: u64) -> String {
    json!({
        "object": "list",
        "model": MODEL,
        "data": [{"object": "embedding", "index": 0, "embedding": vector}],
        "usage": {"prompt_tokens": total_tokens, "total_tokens": total_tokens}
    })
    .to_string()
}

fn service_for(server: &mockito::ServerGuard, key: &str) -> FoundryEmbedding {
    // The configured path is replaced by /models/embeddings.
    let endpoint = format!("{}/api/projects/test", server.url());
    FoundryEmbedding::new(&endpoint, key, MODEL).expect("mock endpoint is valid")
}

/// **Test: A successful call maps vectors and usage.**
///
/// **Setup:** Mock `POST /models/embeddings` expecting the `api-key` header and the JSON
/// body `{"model": …, "input": ["Hello"]}` without `dimensions`.
///
/// **Expected:** One vector `[0.1, 0.2, 0.3]`, usage 4/4, exactly one request.
#[tokio::test]
async fn embed_maps_vector_and_usage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/embeddings")
        .match_header("api-key", "test-key")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"model": MODEL, "input": ["Hello"]})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(embedding_body(&[0.1, 0.2, 0.3], 4))
        .expect(1)
        .create_async()
        .await;

    let output = service_for(&server, "test-key").embed("Hello").await.unwrap();

    assert_eq!(output.vectors, vec![vec![0.1, 0.2, 0.3]]);
    assert_eq!(output.usage, Usage::new(4, 4));
    mock.assert_async().await;
}

/// **Test: Without a key no `api-key` header is sent; dimensions are passed through.**
#[tokio::test]
async fn embed_without_key_sends_dimensions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/embeddings")
        .match_header("api-key", Matcher::Missing)
        .match_body(Matcher::PartialJson(json!({"dimensions": 2})))
        .with_status(200)
        .with_body(embedding_body(&[1.0, 0.0], 1))
        .create_async()
        .await;

    let service = service_for(&server, "").with_dimensions(Some(2));
    let output = service.embed("x").await.unwrap();

    assert_eq!(output.vectors[0], vec![1.0, 0.0]);
    mock.assert_async().await;
}

/// **Test: Data items are returned in index order.**
#[tokio::test]
async fn embed_sorts_by_index() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/embeddings")
        .with_status(200)
        .with_body(
            json!({
                "data": [
                    {"index": 1, "embedding": [2.0]},
                    {"index": 0, "embedding": [1.0]}
                ],
                "usage": {"prompt_tokens": 2, "total_tokens": 2}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let output = service_for(&server, "k").embed("x").await.unwrap();
    assert_eq!(output.vectors, vec![vec![1.0], vec![2.0]]);
}

/// **Test: HTTP 400 is a client request error echoing URL and body.**
///
/// **Expected:** `ClientRequest` with status 400 whose message contains the endpoint URL and
/// the response body `{"error":"bad request"}`.
#[tokio::test]
async fn bad_request_echoes_endpoint_and_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/embeddings")
        .with_status(400)
        .with_body(r#"{"error":"bad request"}"#)
        .create_async()
        .await;

    let service = service_for(&server, "k");
    let err = service.embed("x").await.unwrap_err();

    assert!(matches!(err, EmbeddingError::ClientRequest { status: 400, .. }));
    assert!(err.is_remote_call());
    let message = err.to_string();
    assert!(message.contains(service.url()), "{message}");
    assert!(message.contains(r#"{"error":"bad request"}"#), "{message}");
}

/// **Test: A 5xx response is a service error.**
#[tokio::test]
async fn server_error_is_service_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/embeddings")
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let err = service_for(&server, "k").embed("x").await.unwrap_err();
    match err {
        EmbeddingError::Service { status, endpoint } => {
            assert_eq!(status, 503);
            assert!(endpoint.ends_with("/models/embeddings"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// **Test: A malformed payload is a resource error.**
#[tokio::test]
async fn malformed_payload_is_resource_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/embeddings")
        .with_status(200)
        .with_body(r#"{"data": "nope"}"#)
        .create_async()
        .await;

    let err = service_for(&server, "k").embed("x").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Resource(_)), "{err}");
}

/// **Test: A response without data is a resource error.**
#[tokio::test]
async fn empty_data_is_resource_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/embeddings")
        .with_status(200)
        .with_body(r#"{"data": [], "usage": {"prompt_tokens": 0, "total_tokens": 0}}"#)
        .create_async()
        .await;

    let err = service_for(&server, "k").embed("x").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Resource(_)), "{err}");
}

/// **Test: An unreachable endpoint is a transport error.**
#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let service = FoundryEmbedding::new("http://127.0.0.1:9", "k", MODEL).unwrap();
    let err = service.embed("x").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Transport(_)), "{err}");
}

/// **Test: A response without usage counts as one token.**
///
/// **Expected:** The vector is returned with `total_tokens` equal to `MISSING_USAGE_TOKENS`.
#[tokio::test]
async fn missing_usage_defaults_to_minimal_weight() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/embeddings")
        .with_status(200)
        .with_body(r#"{"data":[{"index":0,"embedding":[1.0,0.0]}]}"#)
        .create_async()
        .await;

    let output = service_for(&server, "k").embed("x").await.unwrap();
    assert_eq!(output.vectors, vec![vec![1.0, 0.0]]);
    assert_eq!(output.usage, Usage::new(0, MISSING_USAGE_TOKENS));
}

/// **Test: A chunk without usage still takes part in the weighted average.**
///
/// **Setup:** Chunk "A" returns `[1,0]` without usage; chunk "B" returns `[0,1]` with 3 tokens.
///
/// **Expected:** Combined vector `[0.25, 0.75]` over 4 tokens; "A" is not dropped.
#[tokio::test]
async fn generator_keeps_chunk_without_usage() {
    let mut server = mockito::Server::new_async().await;
    let _a = server
        .mock("POST", "/models/embeddings")
        .match_body(Matcher::PartialJson(json!({"input": ["A"]})))
        .with_status(200)
        .with_body(r#"{"data":[{"index":0,"embedding":[1.0,0.0]}]}"#)
        .create_async()
        .await;
    let _b = server
        .mock("POST", "/models/embeddings")
        .match_body(Matcher::PartialJson(json!({"input": ["B"]})))
        .with_status(200)
        .with_body(embedding_body(&[0.0, 1.0], 3))
        .create_async()
        .await;

    let generator = EmbeddingGenerator::new(Arc::new(service_for(&server, "k")))
        .with_chunking(Arc::new(LineChunking::new(1)));

    let result = generator.generate(&["A\nB"]).await.unwrap();
    assert_eq!(result.embeddings[0].vector, vec![0.25, 0.75]);
    assert_eq!(result.embeddings[0].tokens, 4);

    let single = generator.generate(&["A"]).await.unwrap();
    assert_eq!(single.embeddings[0].vector, vec![1.0, 0.0]);
}

/// **Test: Token-weighted combination end to end.**
///
/// **Setup:** Chunk "A" returns `[1,0]` with 10 tokens, chunk "B" returns `[0,1]` with 30 tokens;
/// line chunking with a limit of 1 so each line is sent separately.
///
/// **Expected:** Combined vector `[0.25, 0.75]`, total tokens 40, two requests.
#[tokio::test]
async fn generator_combines_remote_chunks() {
    let mut server = mockito::Server::new_async().await;
    let mock_a = server
        .mock("POST", "/models/embeddings")
        .match_body(Matcher::PartialJson(json!({"input": ["A"]})))
        .with_status(200)
        .with_body(embedding_body(&[1.0, 0.0], 10))
        .expect(1)
        .create_async()
        .await;
    let mock_b = server
        .mock("POST", "/models/embeddings")
        .match_body(Matcher::PartialJson(json!({"input": ["B"]})))
        .with_status(200)
        .with_body(embedding_body(&[0.0, 1.0], 30))
        .expect(1)
        .create_async()
        .await;

    let service = Arc::new(service_for(&server, "k"));
    let generator = EmbeddingGenerator::new(service).with_chunking(Arc::new(LineChunking::new(1)));

    let result = generator.generate(&["A\nB"]).await.unwrap();

    assert_eq!(result.embeddings[0].vector, vec![0.25, 0.75]);
    assert_eq!(result.usage.total_tokens, 40);
    assert_eq!(result.model, MODEL);
    mock_a.assert_async().await;
    mock_b.assert_async().await;
}

/// **Test: A 400 on one chunk fails the whole batch.**
#[tokio::test]
async fn generator_propagates_client_error() {
    let mut server = mockito::Server::new_async().await;
    let _ok = server
        .mock("POST", "/models/embeddings")
        .match_body(Matcher::PartialJson(json!({"input": ["A"]})))
        .with_status(200)
        .with_body(embedding_body(&[1.0, 0.0], 10))
        .create_async()
        .await;
    let _bad = server
        .mock("POST", "/models/embeddings")
        .match_body(Matcher::PartialJson(json!({"input": ["B"]})))
        .with_status(400)
        .with_body(r#"{"error":"bad request"}"#)
        .create_async()
        .await;

    let mut generator = EmbeddingGenerator::new(Arc::new(service_for(&server, "k")));
    generator.add_text_chunk("A").add_text_chunk("B");

    let err = generator.build().await.unwrap_err();
    assert!(err.to_string().contains("bad request"));
    assert!(generator.pending_chunks().is_empty());
}

/// **Test: Service built from config targets the derived URL.**
#[tokio::test]
async fn from_config_derives_url_and_dimensions() {
    let config = ModelDeploymentConfig {
        key: "k".to_string(),
        dimensions: Some(64),
        ..ModelDeploymentConfig::new("https://res.services.ai.azure.com/api/projects/p", MODEL)
    };
    let service = FoundryEmbedding::from_config(&config).unwrap();
    assert_eq!(service.url(), "https://res.services.ai.azure.com/models/embeddings");
    assert_eq!(service.dimensions(), Some(64));
    assert_eq!(service.model(), MODEL);
}

/// **Test: Single-text embedding against a real deployment.**
///
/// **Setup:** Reads `EMBEDDING_ENDPOINT`, `EMBEDDING_KEY`, `EMBEDDING_MODEL` from env / root `.env`.
///
/// **Expected:** A non-empty vector and a positive token count.
#[tokio::test]
#[ignore] // Requires a deployment, run with: cargo test -p foundry-embedding -- --ignored
async fn test_foundry_embedding_live() {
    load_root_env();
    let config = ModelDeploymentConfig::from_env().expect("embedding env must parse");
    config
        .validate()
        .expect("EMBEDDING_ENDPOINT and EMBEDDING_MODEL must be set for this test (or set in root .env)");

    let service = FoundryEmbedding::from_config(&config).unwrap();
    let output = service.embed("Hello world").await.unwrap();

    assert!(!output.vectors[0].is_empty());
    assert!(output.usage.total_tokens > 0);
}
