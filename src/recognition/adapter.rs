// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition adapter: provider call, timeout, retry and aggregation

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::provider::TextRecognizer;
use super::types::Transcript;
use crate::errors::TransportError;
use crate::utils::{with_transport_retry, RetryPolicy};

pub struct RecognitionAdapter {
    recognizer: Arc<dyn TextRecognizer>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl RecognitionAdapter {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            recognizer,
            timeout,
            retry,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Recognize one page
    ///
    /// An empty page yields `Transcript { text: "", confidence: 0.0 }`;
    /// failures to reach the service are returned as errors.
    pub async fn recognize(&self, image: &[u8]) -> Result<Transcript, TransportError> {
        let start = Instant::now();
        let recognizer = &self.recognizer;

        let response = with_transport_retry(&self.retry, self.timeout, recognizer.name(), || {
            recognizer.annotate(image)
        })
        .await?;

        let transcript = Transcript::from_response(response, start.elapsed().as_millis() as u64);
        info!(
            "Recognition complete ({}): {} chars, {:.2} confidence ({:?}), {}ms",
            recognizer.name(),
            transcript.text.chars().count(),
            transcript.confidence,
            transcript.confidence_source,
            transcript.elapsed_ms
        );
        Ok(transcript)
    }
}
