use deed_ocr_pipeline::{FieldSchema, RawDocument};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;

use super::common::{pipeline_with, test_config, MockGenerator, MockRecognizer, Reply};

fn documents(markers: &[&str]) -> Vec<RawDocument> {
    markers
        .iter()
        .enumerate()
        .map(|(i, text)| RawDocument::new(format!("doc-{}", i + 1), text.as_bytes().to_vec()))
        .collect()
}

#[tokio::test]
async fn test_batch_isolates_failing_document() {
    let schema = FieldSchema::registry_certificate();
    let pipeline = pipeline_with(
        test_config(),
        MockRecognizer::new(0.99),
        MockGenerator::new(&schema, Reply::AllFields(0.97)),
    );

    let docs = documents(&["所在 一", "所在 二", "FAIL 三", "所在 四", "所在 五"]);
    let report = pipeline.run_batch(docs).await;

    assert_eq!(report.total, 5);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 1);
    assert_eq!(report.success_rate, 0.8);

    // Input order is preserved
    let ids: Vec<&str> = report.entries.iter().map(|e| e.source_id.as_str()).collect();
    assert_eq!(ids, vec!["doc-1", "doc-2", "doc-3", "doc-4", "doc-5"]);

    assert!(!report.entries[2].success);
    assert_eq!(
        report.entries[2].error_kind.as_deref(),
        Some("recognition_transport")
    );
    assert!(report.entries[3].success);
    assert!(report.entries[4].success);
    assert_eq!(report.entries[4].structured_data.as_ref().unwrap().filled_fields(), 15);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source_id, "doc-3");
    assert_eq!(report.timing.count, 4);
    assert_eq!(report.mvp_passed, 4);
    assert_eq!(report.rc_passed, 0);
}

#[tokio::test]
async fn test_batch_respects_concurrency_limit() {
    let schema = FieldSchema::registry_certificate();
    let recognizer = MockRecognizer::with_delay(0.9, Duration::from_millis(30));
    let mut config = test_config();
    config.max_concurrent_documents = 2;
    let pipeline = pipeline_with(
        config,
        recognizer.clone(),
        MockGenerator::new(&schema, Reply::AllFields(0.9)),
    );

    let docs = documents(&["a", "b", "c", "d", "e", "f"]);
    let report = pipeline.run_batch(docs).await;

    assert_eq!(report.succeeded, 6);
    assert!(recognizer.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_batch_counts_parse_errors_as_successes() {
    let schema = FieldSchema::registry_certificate();
    let pipeline = pipeline_with(
        test_config(),
        MockRecognizer::new(0.9),
        MockGenerator::new(&schema, Reply::Raw("```json\n{broken\n```".to_string())),
    );

    let report = pipeline.run_batch(documents(&["所在 一", "所在 二"])).await;
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.parse_errors, 2);
    assert_eq!(report.mvp_passed, 0);
}

#[tokio::test]
async fn test_empty_batch() {
    let schema = FieldSchema::registry_certificate();
    let pipeline = pipeline_with(
        test_config(),
        MockRecognizer::new(0.9),
        MockGenerator::new(&schema, Reply::AllFields(0.9)),
    );

    let report = pipeline.run_batch(Vec::new()).await;
    assert_eq!(report.total, 0);
    assert_eq!(report.success_rate, 0.0);
    assert!(report.entries.is_empty());
}

#[tokio::test]
async fn test_run_directory_loads_supported_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("01.pdf"), "所在 東京都").unwrap();
    std::fs::write(dir.path().join("02.png"), "FAIL").unwrap();
    std::fs::write(dir.path().join("03.jpg"), "x".repeat(200)).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let schema = FieldSchema::registry_certificate();
    let mut config = test_config();
    config.max_document_bytes = 100;
    let pipeline = pipeline_with(
        config,
        MockRecognizer::new(0.9),
        MockGenerator::new(&schema, Reply::AllFields(0.9)),
    );

    let report = pipeline.run_directory(dir.path()).await.unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 1);

    assert!(report.entries[0].source_id.ends_with("01.pdf"));
    assert!(report.entries[0].success);
    assert_eq!(
        report.entries[1].error_kind.as_deref(),
        Some("recognition_transport")
    );
    // Oversized file is rejected at load, not processed
    assert_eq!(report.entries[2].error_kind.as_deref(), Some("input"));
}

#[tokio::test]
async fn test_run_directory_missing_dir() {
    let schema = FieldSchema::registry_certificate();
    let pipeline = pipeline_with(
        test_config(),
        MockRecognizer::new(0.9),
        MockGenerator::new(&schema, Reply::AllFields(0.9)),
    );

    let result = pipeline
        .run_directory(std::path::Path::new("/nonexistent/deeds"))
        .await;
    assert!(result.is_err());
}
