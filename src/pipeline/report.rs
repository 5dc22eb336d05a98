// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-document and batch reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::extraction::{truncate_chars, ExtractionResult};
use crate::performance::{PerformanceReport, TimingStats};
use crate::recognition::{ConfidenceSource, Transcript};

/// Everything one successful run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub transcript: Transcript,
    pub extraction_result: ExtractionResult,
    pub performance_report: PerformanceReport,
    /// Whether the normalized image (rather than the original) was recognized
    pub preprocessed: bool,
}

/// JSON report for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source_id: String,
    pub success: bool,
    /// Seconds, end to end
    pub processing_time: f64,
    pub vision_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_source: Option<ConfidenceSource>,
    /// Transcript preview
    pub extracted_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<ExtractionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_evaluation: Option<PerformanceReport>,
    #[serde(default)]
    pub preprocessed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl DocumentReport {
    pub fn succeeded(source_id: &str, output: PipelineOutput, preview_chars: usize) -> Self {
        Self {
            source_id: source_id.to_string(),
            success: true,
            processing_time: output.performance_report.processing_time,
            vision_confidence: output.transcript.confidence,
            confidence_source: Some(output.transcript.confidence_source),
            extracted_text: truncate_chars(&output.transcript.text, preview_chars),
            structured_data: Some(output.extraction_result),
            performance_evaluation: Some(output.performance_report),
            preprocessed: output.preprocessed,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(source_id: &str, error: &PipelineError, processing_time: f64) -> Self {
        Self {
            source_id: source_id.to_string(),
            success: false,
            processing_time,
            vision_confidence: 0.0,
            confidence_source: None,
            extracted_text: String::new(),
            structured_data: None,
            performance_evaluation: None,
            preprocessed: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
        }
    }

    pub fn has_parse_error(&self) -> bool {
        self.structured_data
            .as_ref()
            .map(|d| d.is_parse_error())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedDocument {
    pub source_id: String,
    pub error: String,
}

/// Aggregate report for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate: f64,
    /// Successful documents whose extraction reply could not be parsed
    pub parse_errors: usize,
    /// Processing times of successful documents
    pub timing: TimingStats,
    pub mvp_passed: usize,
    pub rc_passed: usize,
    pub mvp_time_met: usize,
    pub rc_time_met: usize,
    pub failures: Vec<FailedDocument>,
    /// One entry per input, in input order
    pub entries: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn from_entries(entries: Vec<DocumentReport>) -> Self {
        let total = entries.len();
        let successes: Vec<&DocumentReport> = entries.iter().filter(|e| e.success).collect();
        let succeeded = successes.len();

        let times: Vec<f64> = successes.iter().map(|e| e.processing_time).collect();
        let evaluations: Vec<&PerformanceReport> = successes
            .iter()
            .filter_map(|e| e.performance_evaluation.as_ref())
            .collect();

        let failures = entries
            .iter()
            .filter(|e| !e.success)
            .map(|e| FailedDocument {
                source_id: e.source_id.clone(),
                error: e.error.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            total,
            succeeded,
            failed: total - succeeded,
            success_rate: if total == 0 {
                0.0
            } else {
                succeeded as f64 / total as f64
            },
            parse_errors: successes.iter().filter(|e| e.has_parse_error()).count(),
            timing: TimingStats::from_samples(&times),
            mvp_passed: evaluations.iter().filter(|p| p.tier_results.mvp).count(),
            rc_passed: evaluations.iter().filter(|p| p.tier_results.rc).count(),
            mvp_time_met: evaluations.iter().filter(|p| p.mvp.meets_time).count(),
            rc_time_met: evaluations.iter().filter(|p| p.rc.meets_time).count(),
            failures,
            entries,
        }
    }
}
