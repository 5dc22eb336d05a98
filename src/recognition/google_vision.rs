// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google Cloud Vision text recognition provider
//!
//! Calls `images:annotate` with a single TEXT_DETECTION or
//! DOCUMENT_TEXT_DETECTION feature and API-key authentication.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::provider::TextRecognizer;
use super::types::{RecognitionResponse, WordAnnotation};
use crate::config::VisionFeature;
use crate::errors::TransportError;
use crate::utils::http::{build_client, decode_json, ensure_success};
use crate::vision::image_utils::encode_base64;

const SERVICE: &str = "google_vision";

/// Google Cloud Vision provider
pub struct GoogleVisionRecognizer {
    endpoint: String,
    api_key: String,
    feature: VisionFeature,
    client: Client,
    timeout_ms: u64,
}

impl GoogleVisionRecognizer {
    pub fn new(
        endpoint: &str,
        api_key: String,
        feature: VisionFeature,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            feature,
            client: build_client(timeout)?,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    fn build_request(&self, image: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: encode_base64(image),
                },
                features: vec![Feature {
                    feature_type: self.feature.as_str().to_string(),
                    max_results: 1,
                }],
            }],
        }
    }
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    async fn annotate(&self, image: &[u8]) -> Result<RecognitionResponse, TransportError> {
        let response = self
            .client
            .post(format!("{}/v1/images:annotate", self.endpoint))
            .query(&[("key", self.api_key.as_str())])
            .json(&self.build_request(image))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(SERVICE, e, self.timeout_ms))?;

        let response = ensure_success(SERVICE, response).await?;
        let data: AnnotateResponse = decode_json(SERVICE, response).await?;

        let result = parse_annotate_response(data)?;
        debug!(
            "Vision annotate returned {} chars, {} words",
            result.text.chars().count(),
            result.words.len()
        );
        Ok(result)
    }

    fn name(&self) -> &'static str {
        SERVICE
    }
}

/// Convert the wire response into text plus word confidences
///
/// Text prefers `fullTextAnnotation.text` over `textAnnotations[0]`. Word
/// confidences prefer the page/block/paragraph/word hierarchy and fall back
/// to the per-word `textAnnotations[1..]` entries.
fn parse_annotate_response(data: AnnotateResponse) -> Result<RecognitionResponse, TransportError> {
    let Some(response) = data.responses.into_iter().next() else {
        return Ok(RecognitionResponse::empty());
    };

    if let Some(error) = response.error {
        return Err(TransportError::Api {
            service: SERVICE.to_string(),
            message: format!("{} (code {})", error.message, error.code),
        });
    }

    let full_text = response
        .full_text_annotation
        .as_ref()
        .map(|f| f.text.clone())
        .filter(|t| !t.is_empty());
    let text = full_text
        .or_else(|| {
            response
                .text_annotations
                .first()
                .map(|a| a.description.clone())
        })
        .unwrap_or_default();

    let mut words: Vec<WordAnnotation> = response
        .full_text_annotation
        .iter()
        .flat_map(|f| f.pages.iter())
        .flat_map(|p| p.blocks.iter())
        .flat_map(|b| b.paragraphs.iter())
        .flat_map(|p| p.words.iter())
        .map(|w| WordAnnotation {
            text: w.symbols.iter().map(|s| s.text.as_str()).collect(),
            confidence: w.confidence,
        })
        .collect();

    if words.iter().all(|w| w.confidence.is_none()) {
        words = response
            .text_annotations
            .iter()
            .skip(1)
            .map(|a| WordAnnotation {
                text: a.description.clone(),
                confidence: a.confidence,
            })
            .collect();
    }

    Ok(RecognitionResponse { text, words })
}

// --- Wire format ---

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<StatusError>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Word {
    #[serde(default)]
    symbols: Vec<Symbol>,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct StatusError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}
