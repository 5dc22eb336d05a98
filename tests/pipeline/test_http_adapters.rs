//! Provider adapters against a local mock HTTP service

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine};
use deed_ocr_pipeline::config::{ExtractionProvider, RecognitionProvider, VisionFeature};
use deed_ocr_pipeline::extraction::{build_generator, FieldExtractor, GeminiGenerator};
use deed_ocr_pipeline::recognition::{
    ConfidenceSource, GoogleVisionRecognizer, RecognitionAdapter, RecognitionResponse, Transcript,
};
use deed_ocr_pipeline::utils::RetryPolicy;
use deed_ocr_pipeline::{FieldSchema, Pipeline, PipelineConfig, RawDocument, TransportError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::common::full_reply;

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Ok,
    ServerError,
    ApiError,
    Slow,
}

struct Captured {
    path: String,
    query: Option<String>,
    authorization: Option<String>,
    body: Value,
}

struct ServerState {
    mode: Mode,
    schema: FieldSchema,
    requests: Mutex<Vec<Captured>>,
}

async fn handle(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    // Image transcription requests carry a content array, text prompts a string
    let is_transcription = body["messages"][0]["content"].is_array();
    state.requests.lock().unwrap().push(Captured {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    match state.mode {
        Mode::ServerError => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded").into_response()
        }
        Mode::Slow => tokio::time::sleep(Duration::from_secs(2)).await,
        _ => {}
    }

    let path = uri.path();
    if path.ends_with(":annotate") {
        if state.mode == Mode::ApiError {
            return Json(json!({
                "responses": [{"error": {"code": 3, "message": "Bad image data."}}]
            }))
            .into_response();
        }
        Json(json!({
            "responses": [{
                "textAnnotations": [
                    {"description": "所在 東京都\n地番 1番1"},
                    {"description": "所在"}
                ],
                "fullTextAnnotation": {
                    "text": "所在 東京都\n地番 1番1",
                    "pages": [{"blocks": [{"paragraphs": [{"words": [
                        {"symbols": [{"text": "所"}, {"text": "在"}], "confidence": 0.9},
                        {"symbols": [{"text": "東"}, {"text": "京"}], "confidence": 0.7}
                    ]}]}]}]
                }
            }]
        }))
        .into_response()
    } else if path.ends_with(":generateContent") {
        let text = format!("```json\n{}\n```", full_reply(&state.schema, 0.99));
        Json(json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})).into_response()
    } else if path == "/v1/chat/completions" {
        let content = if is_transcription {
            "  所在 東京都\n地番 1番1\n".to_string()
        } else {
            full_reply(&state.schema, 0.9)
        };
        Json(json!({
            "choices": [{"message": {"content": content}}],
            "usage": {"total_tokens": 42}
        }))
        .into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn spawn_server(mode: Mode) -> (String, Arc<ServerState>) {
    let state = Arc::new(ServerState {
        mode,
        schema: FieldSchema::registry_certificate(),
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new().fallback(handle).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn vision_adapter(base: &str, timeout: Duration, retry: RetryPolicy) -> RecognitionAdapter {
    let recognizer = GoogleVisionRecognizer::new(
        base,
        "test-key".to_string(),
        VisionFeature::DocumentTextDetection,
        timeout,
    )
    .unwrap();
    RecognitionAdapter::new(Arc::new(recognizer), timeout, retry)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        delay_ms: 1,
    }
}

#[tokio::test]
async fn test_google_vision_request_and_confidence() {
    let (base, state) = spawn_server(Mode::Ok).await;
    let adapter = vision_adapter(&base, Duration::from_secs(5), fast_retry());

    let transcript = adapter.recognize(b"page-bytes").await.unwrap();
    assert_eq!(transcript.text, "所在 東京都\n地番 1番1");
    assert_eq!(transcript.word_count, 2);
    assert_eq!(transcript.confidence_source, ConfidenceSource::Measured);
    assert!((transcript.confidence - 0.8).abs() < 1e-9);

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v1/images:annotate");
    assert_eq!(requests[0].query.as_deref(), Some("key=test-key"));

    let request = &requests[0].body["requests"][0];
    assert_eq!(request["features"][0]["type"], "DOCUMENT_TEXT_DETECTION");
    let content = request["image"]["content"].as_str().unwrap();
    assert_eq!(STANDARD.decode(content).unwrap(), b"page-bytes");
}

#[tokio::test]
async fn test_google_vision_http_error_is_retried_once() {
    let (base, state) = spawn_server(Mode::ServerError).await;
    let adapter = vision_adapter(&base, Duration::from_secs(5), fast_retry());

    let result = adapter.recognize(b"page").await;
    match result {
        Err(TransportError::Http {
            status, message, ..
        }) => {
            assert_eq!(status, 500);
            assert!(message.contains("backend exploded"));
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
    assert_eq!(state.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_google_vision_error_object() {
    let (base, _state) = spawn_server(Mode::ApiError).await;
    let adapter = vision_adapter(&base, Duration::from_secs(5), RetryPolicy::none());

    let result = adapter.recognize(b"page").await;
    match result {
        Err(TransportError::Api { message, .. }) => assert!(message.contains("Bad image data")),
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let (base, _state) = spawn_server(Mode::Slow).await;
    let adapter = vision_adapter(&base, Duration::from_millis(100), RetryPolicy::none());

    let result = adapter.recognize(b"page").await;
    assert!(matches!(result, Err(TransportError::Timeout { .. })));
}

#[tokio::test]
async fn test_gemini_fenced_reply() {
    let (base, state) = spawn_server(Mode::Ok).await;
    let schema = FieldSchema::registry_certificate();
    let generator =
        GeminiGenerator::new(&base, "gemini-1.5-flash", "g-key".to_string(), Duration::from_secs(5))
            .unwrap();
    let extractor = FieldExtractor::new(
        Arc::new(generator),
        4000,
        Duration::from_secs(5),
        RetryPolicy::none(),
    );

    let transcript = Transcript::from_response(
        RecognitionResponse {
            text: "所在 東京都".to_string(),
            words: vec![],
        },
        10,
    );
    let result = extractor.extract(&transcript, &schema).await.unwrap();
    assert!(result.parse_error.is_none());
    assert_eq!(result.filled_fields(), 15);
    assert!((result.metadata.average_confidence - 0.99).abs() < 1e-9);

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests[0].path, "/v1beta/models/gemini-1.5-flash:generateContent");
    assert_eq!(requests[0].query.as_deref(), Some("key=g-key"));
    let prompt = requests[0].body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(prompt.contains("所在 東京都"));
}

#[tokio::test]
async fn test_openai_compatible_generator() {
    let (base, state) = spawn_server(Mode::Ok).await;
    let mut config = PipelineConfig::default();
    config.extraction.provider = ExtractionProvider::OpenAi;
    config.extraction.endpoint = Some(base);
    config.extraction.model = "local-model".to_string();

    let generator = build_generator(&config).unwrap();
    let reply = generator.complete("抽出してください").await.unwrap();
    assert!(reply.contains("extracted_data"));

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests[0].path, "/v1/chat/completions");
    assert_eq!(requests[0].body["model"], "local-model");
    assert_eq!(requests[0].body["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_pipeline_against_services() {
    let (base, state) = spawn_server(Mode::Ok).await;
    let mut config = PipelineConfig::default();
    config.retry.delay_ms = 1;
    config.recognition.endpoint = Some(base.clone());
    config.recognition.api_key = Some("v-key".to_string());
    config.extraction.endpoint = Some(base);
    config.extraction.api_key = Some("g-key".to_string());

    let pipeline = Pipeline::from_config(config).unwrap();
    let report = pipeline
        .process_document(&RawDocument::new("deed.pdf", b"%PDF-1.4 page".to_vec()))
        .await;

    assert!(report.success);
    assert!(!report.preprocessed);
    assert!((report.vision_confidence - 0.8).abs() < 1e-9);
    let data = report.structured_data.as_ref().unwrap();
    assert_eq!(data.filled_fields(), 15);
    let evaluation = report.performance_evaluation.as_ref().unwrap();
    assert!(evaluation.tier_results.mvp);
    assert!(evaluation.tier_results.rc);

    let connectivity = pipeline.check_connectivity().await;
    assert!(connectivity.all_ok());
    assert_eq!(connectivity.recognition.provider, "google_vision");
    assert_eq!(connectivity.extraction.provider, "gemini");

    // Two calls per service: one for the document, one for the probe
    assert_eq!(state.requests.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_vlm_and_openai_pipeline_end_to_end() {
    let (base, state) = spawn_server(Mode::Ok).await;
    let mut config = PipelineConfig::default();
    config.retry.delay_ms = 1;
    let vars = [
        ("GOOGLE_API_KEY", "google-secret".to_string()),
        ("OCR_RECOGNITION_PROVIDER", "vlm".to_string()),
        ("OCR_RECOGNITION_ENDPOINT", base.clone()),
        ("OCR_EXTRACTION_PROVIDER", "openai".to_string()),
        ("OCR_EXTRACTION_ENDPOINT", base.clone()),
        ("OCR_EXTRACTION_MODEL", "local-model".to_string()),
    ];
    config.apply_vars(|name| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    });
    assert_eq!(config.recognition.provider, RecognitionProvider::Vlm);

    let pipeline = Pipeline::from_config(config).unwrap();
    let report = pipeline
        .process_document(&RawDocument::new("deed.pdf", b"%PDF-1.4 page".to_vec()))
        .await;

    assert!(report.success);
    // No word confidences from a VLM: informational default
    assert_eq!(report.vision_confidence, 0.8);
    assert_eq!(report.extracted_text, "所在 東京都\n地番 1番1");
    let data = report.structured_data.as_ref().unwrap();
    assert!(data.parse_error.is_none());
    assert_eq!(data.filled_fields(), 15);

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.path == "/v1/chat/completions"));
    assert!(requests.iter().all(|r| r.authorization.is_none()));

    let image_part = &requests[0].body["messages"][0]["content"][1];
    let url = image_part["image_url"]["url"].as_str().unwrap();
    assert!(url.starts_with("data:application/pdf;base64,"));

    assert_eq!(requests[1].body["model"], "local-model");
    let prompt = requests[1].body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("所在 東京都"));
}

#[tokio::test]
async fn test_openai_bearer_key_is_sent_when_configured() {
    let (base, state) = spawn_server(Mode::Ok).await;
    let mut config = PipelineConfig::default();
    config.extraction.provider = ExtractionProvider::OpenAi;
    config.extraction.endpoint = Some(base);
    config.extraction.api_key = Some("local-token".to_string());

    let generator = build_generator(&config).unwrap();
    generator.complete("抽出してください").await.unwrap();

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer local-token"));
}
