// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition result types

use serde::{Deserialize, Serialize};

/// Confidence reported when the service returns text but no per-word scores
///
/// Informational only; never treated as measured accuracy.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// A recognized word with its optional confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAnnotation {
    pub text: String,
    pub confidence: Option<f64>,
}

/// What a recognition provider returns before aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    /// Full-page text (empty when nothing was recognized)
    pub text: String,
    pub words: Vec<WordAnnotation>,
}

impl RecognitionResponse {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Where a transcript's confidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// Mean of the per-word confidences the service reported
    Measured,
    /// Text was present but no per-word confidences; `DEFAULT_CONFIDENCE` used
    Default,
    /// Nothing was recognized; confidence is exactly 0.0
    Empty,
}

/// Recognized text of one page plus its aggregate confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// In [0, 1]; exactly 0.0 when `text` is empty
    pub confidence: f64,
    pub confidence_source: ConfidenceSource,
    pub word_count: usize,
    /// Wall-clock time of the recognition call, retries included
    pub elapsed_ms: u64,
}

impl Transcript {
    pub fn empty(elapsed_ms: u64) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            confidence_source: ConfidenceSource::Empty,
            word_count: 0,
            elapsed_ms,
        }
    }

    /// Aggregate a provider response into a transcript
    pub fn from_response(response: RecognitionResponse, elapsed_ms: u64) -> Self {
        if response.text.trim().is_empty() {
            return Self::empty(elapsed_ms);
        }

        let (confidence, confidence_source) = match aggregate_confidence(&response.words) {
            Some(mean) => (mean, ConfidenceSource::Measured),
            None => (DEFAULT_CONFIDENCE, ConfidenceSource::Default),
        };

        Self {
            text: response.text,
            confidence,
            confidence_source,
            word_count: response.words.len(),
            elapsed_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Seconds, for reports
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

/// Arithmetic mean of the word confidences present, clamped to [0, 1]
///
/// Returns `None` when no word carries a confidence.
pub fn aggregate_confidence(words: &[WordAnnotation]) -> Option<f64> {
    let scores: Vec<f64> = words
        .iter()
        .filter_map(|w| w.confidence)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .collect();

    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
