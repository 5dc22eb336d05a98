use deed_ocr_pipeline::extraction::{parse_extraction_response, FieldExtractor};
use deed_ocr_pipeline::performance::{evaluate, PerformanceTargets};
use deed_ocr_pipeline::recognition::{RecognitionResponse, Transcript};
use deed_ocr_pipeline::utils::RetryPolicy;
use deed_ocr_pipeline::FieldSchema;
use std::time::Duration;

use super::common::{full_reply, MockGenerator, Reply};

/// Replies that a generative service might plausibly send back
fn replies(schema: &FieldSchema) -> Vec<String> {
    vec![
        full_reply(schema, 0.9),
        format!("```json\n{}\n```", full_reply(schema, 0.8)),
        r#"{"extracted_data": {"所在": "東京都"}}"#.to_string(),
        r#"{"extracted_data": {"未知の項目": "x"}, "confidence_scores": {"未知の項目": 2}}"#.to_string(),
        r#"{"confidence_scores": {"所在": 0.5}}"#.to_string(),
        r#"{"extracted_data": null}"#.to_string(),
        r#"{"extracted_data": []}"#.to_string(),
        "not json".to_string(),
        "".to_string(),
        "[]".to_string(),
        "42".to_string(),
    ]
}

#[test]
fn test_every_reply_covers_the_schema() {
    for schema in [
        FieldSchema::registry_certificate(),
        FieldSchema::new(["所在", "地番"]).unwrap(),
    ] {
        for reply in replies(&schema) {
            let result = parse_extraction_response(&schema, &reply);
            assert!(result.matches_schema(&schema), "reply: {}", reply);
            assert_eq!(result.metadata.total_fields, schema.len());

            let mean = result.confidence_scores.values().sum::<f64>() / schema.len() as f64;
            assert!((result.metadata.average_confidence - mean).abs() < 1e-9);

            let report = evaluate(10.0, &result, &PerformanceTargets::default());
            assert!((0.0..=1.0).contains(&report.accuracy.extraction_rate));
            assert!((0.0..=1.0).contains(&report.accuracy.average_confidence));
        }
    }
}

#[test]
fn test_not_json_is_recorded() {
    let schema = FieldSchema::registry_certificate();
    let result = parse_extraction_response(&schema, "not json");
    assert!(result.parse_error.is_some());
    assert_eq!(result.raw_response.as_deref(), Some("not json"));
}

#[tokio::test]
async fn test_extractor_truncates_long_transcripts() {
    let schema = FieldSchema::registry_certificate();
    let generator = MockGenerator::new(&schema, Reply::AllFields(0.9));
    let extractor = FieldExtractor::new(
        generator.clone(),
        100,
        Duration::from_secs(1),
        RetryPolicy::none(),
    );

    let transcript = Transcript::from_response(
        RecognitionResponse {
            text: "登".repeat(500),
            words: vec![],
        },
        1,
    );
    let result = extractor.extract(&transcript, &schema).await.unwrap();
    assert_eq!(result.filled_fields(), 15);

    let prompt = generator.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains(&format!("{}...", "登".repeat(100))));
    assert!(!prompt.contains(&"登".repeat(101)));
}
