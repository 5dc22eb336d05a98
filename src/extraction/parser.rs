// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Parsing and schema normalisation of generative service replies
//!
//! The reply is parsed as-is (after removing a surrounding Markdown fence);
//! malformed JSON is recorded, never repaired.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{error, warn};

use super::types::ExtractionResult;
use crate::config::FieldSchema;

/// Remove a surrounding ```json ... ``` fence, if any
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a reply into a schema-complete `ExtractionResult`
///
/// Never fails: unparseable replies produce a result with `parse_error` and
/// `raw_response` set and every field empty.
pub fn parse_extraction_response(schema: &FieldSchema, raw: &str) -> ExtractionResult {
    let value: Value = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(value) => value,
        Err(e) => {
            error!(
                "Extraction reply is not valid JSON ({} chars): {}",
                raw.chars().count(),
                e
            );
            return ExtractionResult::parse_failure(schema, raw, format!("JSON parse error: {}", e));
        }
    };

    let Value::Object(root) = value else {
        error!("Extraction reply is not a JSON object");
        return ExtractionResult::parse_failure(schema, raw, "reply is not a JSON object");
    };

    let empty = Map::new();
    let data = match root.get("extracted_data") {
        Some(Value::Object(data)) => data,
        None | Some(Value::Null) => &empty,
        Some(_) => {
            error!("Extraction reply has a non-object extracted_data");
            return ExtractionResult::parse_failure(schema, raw, "extracted_data is not an object");
        }
    };
    let scores = match root.get("confidence_scores") {
        Some(Value::Object(scores)) => scores,
        _ => &empty,
    };

    let mut extracted_data = IndexMap::with_capacity(schema.len());
    let mut confidence_scores = IndexMap::with_capacity(schema.len());
    let mut missing = Vec::new();

    for field in schema.iter() {
        let value = match data.get(field) {
            Some(value) => value_to_text(value),
            None => {
                missing.push(field.to_string());
                String::new()
            }
        };
        extracted_data.insert(field.to_string(), value);
        confidence_scores.insert(
            field.to_string(),
            scores.get(field).map(value_to_confidence).unwrap_or(0.0),
        );
    }

    let extra: Vec<&str> = data
        .keys()
        .map(String::as_str)
        .filter(|k| !schema.contains(k))
        .collect();
    if !extra.is_empty() {
        warn!("Dropping fields outside the schema: {}", extra.join(", "));
    }
    if !missing.is_empty() {
        warn!(
            "Extraction reply omitted {} field(s), backfilled as empty: {}",
            missing.len(),
            missing.join(", ")
        );
    }

    let mut result = ExtractionResult::from_maps(extracted_data, confidence_scores);
    result.schema_violations = missing;
    result
}

/// Field value as text: strings trimmed, null empty, other scalars stringified
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Confidence as a number in [0, 1]; anything unusable is 0.0
fn value_to_confidence(value: &Value) -> f64 {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if s.is_finite() => s.clamp(0.0, 1.0),
        _ => 0.0,
    }
}
