use deed_ocr_pipeline::recognition::ConfidenceSource;
use deed_ocr_pipeline::vision::image_utils::encode_png;
use deed_ocr_pipeline::{FieldSchema, PipelineError, RawDocument, TransportError};
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::atomic::Ordering;

use super::common::{pipeline_with, test_config, MockGenerator, MockRecognizer, Reply};

fn text_document(text: &str) -> RawDocument {
    RawDocument::new("deed-1.pdf", text.as_bytes().to_vec())
}

#[tokio::test]
async fn test_run_classifies_tiers() {
    let schema = FieldSchema::registry_certificate();
    let recognizer = MockRecognizer::new(0.99);
    let generator = MockGenerator::new(&schema, Reply::AllFields(0.97));
    let pipeline = pipeline_with(test_config(), recognizer, generator.clone());

    let output = pipeline
        .run(&text_document("所在 東京都新宿区 地番 1番1"))
        .await
        .unwrap();

    assert_eq!(output.transcript.text, "所在 東京都新宿区 地番 1番1");
    assert!((output.transcript.confidence - 0.99).abs() < 1e-9);
    assert_eq!(output.transcript.confidence_source, ConfidenceSource::Measured);
    assert!(output.extraction_result.matches_schema(&schema));

    let report = &output.performance_report;
    assert_eq!(report.accuracy.extraction_rate, 1.0);
    assert!((report.accuracy.average_confidence - 0.97).abs() < 1e-9);
    assert!(report.tier_results.mvp);
    assert!(!report.tier_results.rc);

    // Transcript reached the prompt
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("所在 東京都新宿区"));
}

#[tokio::test]
async fn test_unparseable_reply_is_not_short_circuited() {
    let schema = FieldSchema::registry_certificate();
    let generator = MockGenerator::new(&schema, Reply::Raw("not json".to_string()));
    let pipeline = pipeline_with(test_config(), MockRecognizer::new(0.9), generator.clone());

    let doc = text_document("所在 大阪市");
    let output = pipeline.run(&doc).await.unwrap();
    let result = &output.extraction_result;
    assert!(result.parse_error.is_some());
    assert_eq!(result.raw_response.as_deref(), Some("not json"));
    assert!(result.matches_schema(&schema));
    assert_eq!(output.performance_report.accuracy.extraction_rate, 0.0);
    // Parse failures are never retried
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    let report = pipeline.process_document(&doc).await;
    assert!(report.success);
    assert!(report.has_parse_error());
}

#[tokio::test]
async fn test_recognition_transport_error_short_circuits() {
    let schema = FieldSchema::registry_certificate();
    let recognizer = MockRecognizer::new(0.9);
    let generator = MockGenerator::new(&schema, Reply::AllFields(0.9));
    let pipeline = pipeline_with(test_config(), recognizer.clone(), generator.clone());

    let doc = text_document("FAIL");
    let result = pipeline.run(&doc).await;
    assert!(matches!(
        result,
        Err(PipelineError::Recognition(TransportError::Network { .. }))
    ));
    // One retry, then give up; extraction never runs
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

    let report = pipeline.process_document(&doc).await;
    assert!(!report.success);
    assert_eq!(report.error_kind.as_deref(), Some("recognition_transport"));
    assert!(report.structured_data.is_none());
}

#[tokio::test]
async fn test_extraction_transport_error_short_circuits() {
    let schema = FieldSchema::registry_certificate();
    let generator = MockGenerator::new(&schema, Reply::Fail);
    let pipeline = pipeline_with(test_config(), MockRecognizer::new(0.9), generator.clone());

    let result = pipeline.run(&text_document("所在 東京都")).await;
    assert!(matches!(
        result,
        Err(PipelineError::Extraction(TransportError::Http { status: 503, .. }))
    ));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_recognition_yields_empty_extraction() {
    let schema = FieldSchema::registry_certificate();
    let generator = MockGenerator::new(&schema, Reply::AllFields(0.9));
    let pipeline = pipeline_with(test_config(), MockRecognizer::new(0.9), generator.clone());

    let output = pipeline.run(&text_document("BLANK")).await.unwrap();
    assert_eq!(output.transcript.text, "");
    assert_eq!(output.transcript.confidence, 0.0);
    assert_eq!(output.extraction_result.filled_fields(), 0);
    assert!(output.extraction_result.matches_schema(&schema));
    assert!(!output.performance_report.tier_results.mvp);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_partial_reply_is_backfilled() {
    let schema = FieldSchema::new(["所在", "地番", "地目"]).unwrap();
    let mut config = test_config();
    config.schema = schema.clone();
    let reply = r#"{"extracted_data": {"地番": "12番3"}, "confidence_scores": {"地番": 0.9}}"#;
    let generator = MockGenerator::new(&schema, Reply::Raw(reply.to_string()));
    let pipeline = pipeline_with(config, MockRecognizer::new(0.9), generator);

    let output = pipeline.run(&text_document("地番 12番3")).await.unwrap();
    let result = &output.extraction_result;
    assert!(result.matches_schema(&schema));
    assert_eq!(result.extracted_data["所在"], "");
    assert_eq!(result.schema_violations, vec!["所在", "地目"]);
    assert!((result.metadata.average_confidence - 0.3).abs() < 1e-9);
}

#[tokio::test]
async fn test_images_are_normalized_before_recognition() {
    let schema = FieldSchema::registry_certificate();
    let recognizer = MockRecognizer::new(0.9);
    let generator = MockGenerator::new(&schema, Reply::AllFields(0.9));
    let pipeline = pipeline_with(test_config(), recognizer.clone(), generator);

    let mut page = RgbImage::from_pixel(32, 32, Rgb([230, 225, 215]));
    for x in 4..28 {
        page.put_pixel(x, 16, Rgb([20, 20, 20]));
    }
    let raw = encode_png(&DynamicImage::ImageRgb8(page)).unwrap();

    let report = pipeline
        .process_document(&RawDocument::new("scan.png", raw.clone()))
        .await;
    assert!(report.success);
    assert!(report.preprocessed);

    let seen = recognizer.seen.lock().unwrap();
    assert_ne!(seen[0], raw);
    let binarized = image::load_from_memory(&seen[0]).unwrap().to_luma8();
    assert!(binarized.pixels().all(|p| p[0] == 0 || p[0] == 255));
}

#[tokio::test]
async fn test_report_preview_is_truncated() {
    let schema = FieldSchema::registry_certificate();
    let mut config = test_config();
    config.preview_chars = 10;
    let pipeline = pipeline_with(
        config,
        MockRecognizer::new(0.9),
        MockGenerator::new(&schema, Reply::AllFields(0.9)),
    );

    let report = pipeline
        .process_document(&text_document("所在 東京都新宿区西新宿二丁目八番一号"))
        .await;
    assert_eq!(report.extracted_text.chars().count(), 13);
    assert!(report.extracted_text.ends_with("..."));

    let json = serde_json::to_value(&report).unwrap();
    for key in [
        "success",
        "processing_time",
        "vision_confidence",
        "extracted_text",
        "structured_data",
        "performance_evaluation",
    ] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
}
