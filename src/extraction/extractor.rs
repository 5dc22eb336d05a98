// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Field extractor: prompt, generative call, parse and schema backfill

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::parser::parse_extraction_response;
use super::prompt::build_extraction_prompt;
use super::provider::TextGenerator;
use super::types::ExtractionResult;
use crate::config::FieldSchema;
use crate::errors::TransportError;
use crate::recognition::Transcript;
use crate::utils::{with_transport_retry, RetryPolicy};

pub struct FieldExtractor {
    generator: Arc<dyn TextGenerator>,
    max_text_chars: usize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl FieldExtractor {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        max_text_chars: usize,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            max_text_chars,
            timeout,
            retry,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Extract `schema`'s fields from a transcript
    ///
    /// Only transport failures are errors. An unparseable reply comes back as
    /// a result with `parse_error` set; it is never retried.
    pub async fn extract(
        &self,
        transcript: &Transcript,
        schema: &FieldSchema,
    ) -> Result<ExtractionResult, TransportError> {
        let start = Instant::now();

        if transcript.is_empty() {
            debug!("Empty transcript, skipping {} call", self.generator.name());
            return Ok(ExtractionResult::empty(schema));
        }

        let prompt = build_extraction_prompt(schema, &transcript.text, self.max_text_chars);
        let generator = &self.generator;
        let prompt_ref = prompt.as_str();

        let reply = with_transport_retry(&self.retry, self.timeout, generator.name(), || {
            generator.complete(prompt_ref)
        })
        .await?;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let result = parse_extraction_response(schema, &reply).with_elapsed_ms(elapsed_ms);
        info!(
            "Extraction complete ({}): {}/{} fields, {:.2} avg confidence, {}ms",
            generator.name(),
            result.filled_fields(),
            schema.len(),
            result.metadata.average_confidence,
            elapsed_ms
        );
        Ok(result)
    }
}
