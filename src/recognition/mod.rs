// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition
//!
//! Providers turn a page image into text plus optional word confidences;
//! the adapter adds timeout, retry and confidence aggregation.

pub mod adapter;
pub mod google_vision;
pub mod provider;
pub mod types;
pub mod vlm;

pub use adapter::RecognitionAdapter;
pub use google_vision::GoogleVisionRecognizer;
pub use provider::TextRecognizer;
pub use types::{
    aggregate_confidence, ConfidenceSource, RecognitionResponse, Transcript, WordAnnotation,
    DEFAULT_CONFIDENCE,
};
pub use vlm::VlmRecognizer;

use std::sync::Arc;

use crate::config::{ConfigError, PipelineConfig, RecognitionProvider};
use crate::vision::VlmClient;

/// Build the configured recognition provider
pub fn build_recognizer(config: &PipelineConfig) -> Result<Arc<dyn TextRecognizer>, ConfigError> {
    let recognition = &config.recognition;
    let timeout = config.recognition_timeout();

    match recognition.provider {
        RecognitionProvider::GoogleVision => {
            let api_key = recognition.api_key.clone().ok_or_else(|| {
                ConfigError::Invalid(
                    "google_vision recognition requires an API key (GOOGLE_API_KEY)".to_string(),
                )
            })?;
            let recognizer = GoogleVisionRecognizer::new(
                recognition.endpoint(),
                api_key,
                recognition.feature,
                timeout,
            )
            .map_err(|e| ConfigError::Client(e.to_string()))?;
            Ok(Arc::new(recognizer))
        }
        RecognitionProvider::Vlm => {
            let client = VlmClient::new("vlm", recognition.endpoint(), &recognition.model, timeout)
                .map_err(|e| ConfigError::Client(e.to_string()))?
                .with_api_key(recognition.api_key.clone());
            Ok(Arc::new(VlmRecognizer::new(client)))
        }
    }
}
