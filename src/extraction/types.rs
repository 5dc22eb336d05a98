// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extraction result types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::FieldSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub total_fields: usize,
    /// Mean of `confidence_scores`
    pub average_confidence: f64,
}

/// Field values extracted from one transcript
///
/// `extracted_data` and `confidence_scores` always carry exactly the schema's
/// fields, in schema order, whatever the generative service returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub extracted_data: IndexMap<String, String>,
    pub confidence_scores: IndexMap<String, f64>,
    pub metadata: ExtractionMetadata,
    /// Set when the service reply could not be parsed as a result object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    /// Unparsed reply, kept alongside `parse_error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// Schema fields the reply omitted (backfilled with "")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_violations: Vec<String>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl ExtractionResult {
    /// Build a result from schema-complete maps, computing metadata
    pub fn from_maps(
        extracted_data: IndexMap<String, String>,
        confidence_scores: IndexMap<String, f64>,
    ) -> Self {
        let total_fields = extracted_data.len();
        let average_confidence = if confidence_scores.is_empty() {
            0.0
        } else {
            confidence_scores.values().sum::<f64>() / confidence_scores.len() as f64
        };

        Self {
            extracted_data,
            confidence_scores,
            metadata: ExtractionMetadata {
                total_fields,
                average_confidence,
            },
            parse_error: None,
            raw_response: None,
            schema_violations: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Every field empty with zero confidence
    pub fn empty(schema: &FieldSchema) -> Self {
        let extracted_data = schema.iter().map(|f| (f.to_string(), String::new())).collect();
        let confidence_scores = schema.iter().map(|f| (f.to_string(), 0.0)).collect();
        Self::from_maps(extracted_data, confidence_scores)
    }

    /// Schema-complete empty result recording an unparseable reply
    pub fn parse_failure(schema: &FieldSchema, raw_response: &str, error: impl Into<String>) -> Self {
        let mut result = Self::empty(schema);
        result.parse_error = Some(error.into());
        result.raw_response = Some(raw_response.to_string());
        result
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_parse_error(&self) -> bool {
        self.parse_error.is_some()
    }

    /// Number of fields with a non-empty value
    pub fn filled_fields(&self) -> usize {
        self.extracted_data.values().filter(|v| !v.is_empty()).count()
    }

    /// True when the field set equals the schema, in order
    pub fn matches_schema(&self, schema: &FieldSchema) -> bool {
        self.extracted_data.keys().map(String::as_str).eq(schema.iter())
            && self.confidence_scores.keys().map(String::as_str).eq(schema.iter())
    }
}
