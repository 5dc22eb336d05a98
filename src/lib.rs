// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod performance;
pub mod pipeline;
pub mod recognition;
pub mod utils;
pub mod version;
pub mod vision;

pub use config::{FieldSchema, PipelineConfig};
pub use errors::{PipelineError, TransportError};
pub use extraction::{ExtractionResult, FieldExtractor, TextGenerator};
pub use performance::{evaluate, PerformanceReport, PerformanceTargets, TierTarget};
pub use pipeline::{BatchReport, DocumentReport, Pipeline, PipelineOutput, RawDocument};
pub use recognition::{RecognitionAdapter, TextRecognizer, Transcript};
pub use vision::{normalize, NormalizedImage};
