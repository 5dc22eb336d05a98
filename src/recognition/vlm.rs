// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision-language model recognition provider

use async_trait::async_trait;

use super::provider::TextRecognizer;
use super::types::RecognitionResponse;
use crate::errors::TransportError;
use crate::vision::VlmClient;

/// Transcribes pages through an OpenAI-compatible VLM sidecar
///
/// The model returns plain text only, so transcripts from this provider
/// never carry measured confidences.
pub struct VlmRecognizer {
    client: VlmClient,
}

impl VlmRecognizer {
    pub fn new(client: VlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextRecognizer for VlmRecognizer {
    async fn annotate(&self, image: &[u8]) -> Result<RecognitionResponse, TransportError> {
        let text = self.client.transcribe(image).await?;
        Ok(RecognitionResponse {
            text: text.trim().to_string(),
            words: Vec::new(),
        })
    }

    fn name(&self) -> &'static str {
        self.client.service()
    }
}
