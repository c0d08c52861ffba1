//! Integration tests for the HTTP surface.
//!
//! A real pipeline is wired over a temp voices directory with an instant
//! stub engine and the silent sink, so these tests exercise routing,
//! status codes, and JSON shapes end to end without hardware.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use speakd_axum::state::ServiceContext;
use speakd_axum::{AppState, create_router};
use speakd_core::catalog::{Voice, VoiceCatalog};
use speakd_core::config::SourceConfig;
use speakd_core::engine::{EngineHandle, SpeechEngine, SynthesizedAudio};
use speakd_core::error::SpeakError;
use speakd_core::queue::{QueueSettings, SpeechQueue};
use speakd_core::router::SourceRouter;
use speakd_core::sink::SilentSink;
use speakd_core::synth::SynthesizerPool;
use speakd_core::SelectionCapture;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Engine returning a short burst of silence instantly.
struct StubEngine;

struct StubHandle;

impl SpeechEngine for StubEngine {
    fn load(&self, _voice: &Voice) -> Result<Box<dyn EngineHandle>, SpeakError> {
        Ok(Box::new(StubHandle))
    }
}

impl EngineHandle for StubHandle {
    fn generate(&mut self, _text: &str, _speed: f32) -> Result<SynthesizedAudio, SpeakError> {
        Ok(SynthesizedAudio {
            samples: vec![0.0; 160],
            sample_rate: 16_000,
        })
    }
}

fn test_state() -> (AppState, tempfile::TempDir) {
    let voices_dir = tempfile::tempdir().unwrap();
    std::fs::write(voices_dir.path().join("test-voice.onnx"), b"onnx").unwrap();
    std::fs::write(
        voices_dir.path().join("test-voice.onnx.json"),
        r#"{"audio":{"sample_rate":16000}}"#,
    )
    .unwrap();

    let catalog = VoiceCatalog::open(voices_dir.path(), "test-voice").unwrap();
    let pool = Arc::new(SynthesizerPool::new(catalog.clone(), Arc::new(StubEngine)));
    let queue = SpeechQueue::start(
        QueueSettings::default(),
        Arc::clone(&pool),
        Arc::new(SilentSink),
    );

    let mut sources = HashMap::new();
    sources.insert("default".to_owned(), SourceConfig::default());
    sources.insert(
        "t-tracker".to_owned(),
        SourceConfig {
            voice: None,
            filters: Some(vec!["arrived".to_owned()]),
            priority: 1,
        },
    );
    let router = SourceRouter::new(&sources, catalog.clone(), queue.clone());

    let state = Arc::new(ServiceContext {
        catalog,
        pool,
        queue,
        router,
        capture: SelectionCapture::new(),
    });
    (state, voices_dir)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("expected JSON body: {e}"))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

// ── /health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ── POST /api/speak ───────────────────────────────────────────────────────────

#[tokio::test]
async fn speak_admits_and_returns_id() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(post_json("/api/speak", r#"{"text":"hello world"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["queued"], true);
    assert!(json["id"].is_string(), "admitted speak must carry an id");
}

#[tokio::test]
async fn speak_empty_text_is_bad_request() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(post_json("/api/speak", r#"{"text":"   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "text is required");
}

#[tokio::test]
async fn speak_filter_rejection_is_accepted_but_not_queued() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(post_json(
            "/api/speak",
            r#"{"text":"no keyword here","source":"t-tracker"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["queued"], false);
    assert!(json["id"].is_null(), "rejected speak must carry id: null");
}

#[tokio::test]
async fn speak_matching_filter_is_queued() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(post_json(
            "/api/speak",
            r#"{"text":"Bus arrived","source":"t-tracker"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["queued"], true);
}

// ── POST /api/speak-selection ─────────────────────────────────────────────────

/// Headless hosts have no selection to capture: the endpoint reports an
/// empty selection rather than an error.
#[cfg(not(windows))]
#[tokio::test]
async fn speak_selection_without_selection_is_empty() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(post_json("/api/speak-selection", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["queued"], false);
    assert_eq!(json["text"], "");
}

// ── GET /api/voices ───────────────────────────────────────────────────────────

#[tokio::test]
async fn voices_lists_catalog_snapshot() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/voices")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let voices = json.as_array().expect("voices must be an array");
    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0]["id"], "test-voice");
    assert_eq!(voices[0]["name"], "test-voice");
    assert_eq!(voices[0]["sampleRate"], 16_000);
}

// ── GET /api/status ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_running_and_depth() {
    let (state, _dir) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["running"], true);
    assert!(json["activeVoices"].is_number());
    assert!(json["queueDepth"].is_number());
}

// ── POST /api/stop ────────────────────────────────────────────────────────────

#[tokio::test]
async fn stop_clears_queue_and_reports_stopped() {
    let (state, _dir) = test_state();
    let app = create_router(Arc::clone(&state));

    // Seed a few utterances, then stop.
    for _ in 0..3 {
        let _ = app
            .clone()
            .oneshot(post_json("/api/speak", r#"{"text":"something to say"}"#))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stop")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["stopped"], true);
    assert_eq!(state.queue.depth(), 0);
}
