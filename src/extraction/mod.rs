// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Structured field extraction from transcripts

pub mod extractor;
pub mod gemini;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod types;

pub use extractor::FieldExtractor;
pub use gemini::GeminiGenerator;
pub use openai::OpenAiGenerator;
pub use parser::{parse_extraction_response, strip_code_fence};
pub use prompt::{build_extraction_prompt, truncate_chars};
pub use provider::TextGenerator;
pub use types::{ExtractionMetadata, ExtractionResult};

use std::sync::Arc;

use crate::config::{ConfigError, ExtractionProvider, PipelineConfig};
use crate::vision::VlmClient;

/// Build the configured generative provider
pub fn build_generator(config: &PipelineConfig) -> Result<Arc<dyn TextGenerator>, ConfigError> {
    let extraction = &config.extraction;
    let timeout = config.extraction_timeout();

    match extraction.provider {
        ExtractionProvider::Gemini => {
            let api_key = extraction.api_key.clone().ok_or_else(|| {
                ConfigError::Invalid(
                    "gemini extraction requires an API key (GOOGLE_API_KEY or OCR_EXTRACTION_API_KEY)"
                        .to_string(),
                )
            })?;
            let generator =
                GeminiGenerator::new(extraction.endpoint(), &extraction.model, api_key, timeout)
                    .map_err(|e| ConfigError::Client(e.to_string()))?
                    .with_generation_config(extraction.temperature, extraction.max_output_tokens);
            Ok(Arc::new(generator))
        }
        ExtractionProvider::OpenAi => {
            let client = VlmClient::new("openai", extraction.endpoint(), &extraction.model, timeout)
                .map_err(|e| ConfigError::Client(e.to_string()))?
                .with_api_key(extraction.api_key.clone())
                .with_sampling(extraction.max_output_tokens, extraction.temperature);
            Ok(Arc::new(OpenAiGenerator::new(client)))
        }
    }
}
