// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scoring a pipeline run against the MVP and release-candidate targets

use serde::{Deserialize, Serialize};

use crate::extraction::ExtractionResult;

/// Time ceiling (seconds) and accuracy floor for one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTarget {
    pub processing_time: f64,
    pub accuracy: f64,
}

impl TierTarget {
    fn validate(&self, tier: &str) -> Result<(), String> {
        if !(self.processing_time.is_finite() && self.processing_time > 0.0) {
            return Err(format!(
                "{} processing_time must be positive, got {}",
                tier, self.processing_time
            ));
        }
        if !(self.accuracy > 0.0 && self.accuracy <= 1.0) {
            return Err(format!(
                "{} accuracy must be in (0, 1], got {}",
                tier, self.accuracy
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceTargets {
    pub mvp: TierTarget,
    pub rc: TierTarget,
}

impl Default for PerformanceTargets {
    fn default() -> Self {
        Self {
            mvp: TierTarget {
                processing_time: 60.0,
                accuracy: 0.95,
            },
            rc: TierTarget {
                processing_time: 30.0,
                accuracy: 0.98,
            },
        }
    }
}

impl PerformanceTargets {
    /// Both tiers well-formed and RC no looser than MVP
    pub fn validate(&self) -> Result<(), String> {
        self.mvp.validate("mvp")?;
        self.rc.validate("rc")?;

        if self.rc.processing_time > self.mvp.processing_time {
            return Err(format!(
                "rc processing_time ({}) must not exceed mvp ({})",
                self.rc.processing_time, self.mvp.processing_time
            ));
        }
        if self.rc.accuracy < self.mvp.accuracy {
            return Err(format!(
                "rc accuracy ({}) must not be below mvp ({})",
                self.rc.accuracy, self.mvp.accuracy
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Fraction of schema fields with a non-empty value, in [0, 1]
    pub extraction_rate: f64,
    /// In [0, 1]
    pub average_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierResults {
    pub mvp: bool,
    pub rc: bool,
}

/// Per-tier breakdown of a classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierEvaluation {
    pub target: TierTarget,
    pub meets_time: bool,
    pub meets_accuracy: bool,
    pub passed: bool,
}

impl TierEvaluation {
    fn classify(target: TierTarget, processing_time: f64, average_confidence: f64) -> Self {
        let meets_time = processing_time <= target.processing_time;
        let meets_accuracy = average_confidence >= target.accuracy;
        Self {
            target,
            meets_time,
            meets_accuracy,
            passed: meets_time && meets_accuracy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Seconds
    pub processing_time: f64,
    pub accuracy: AccuracyMetrics,
    pub tier_results: TierResults,
    pub mvp: TierEvaluation,
    pub rc: TierEvaluation,
}

/// Classify one run. Pure.
pub fn evaluate(
    processing_time: f64,
    result: &ExtractionResult,
    targets: &PerformanceTargets,
) -> PerformanceReport {
    let total = result.extracted_data.len();
    let extraction_rate = if total == 0 {
        0.0
    } else {
        result.filled_fields() as f64 / total as f64
    };

    let average_confidence = if result.metadata.average_confidence.is_finite() {
        result.metadata.average_confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mvp = TierEvaluation::classify(targets.mvp, processing_time, average_confidence);
    let rc = TierEvaluation::classify(targets.rc, processing_time, average_confidence);

    PerformanceReport {
        processing_time,
        accuracy: AccuracyMetrics {
            extraction_rate,
            average_confidence,
        },
        tier_results: TierResults {
            mvp: mvp.passed,
            rc: rc.passed,
        },
        mvp,
        rc,
    }
}
