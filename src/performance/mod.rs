// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Performance scoring of pipeline runs

pub mod evaluator;
pub mod stats;

pub use evaluator::{
    evaluate, AccuracyMetrics, PerformanceReport, PerformanceTargets, TierEvaluation,
    TierResults, TierTarget,
};
pub use stats::TimingStats;
