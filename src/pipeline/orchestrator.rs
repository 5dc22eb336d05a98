// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-document pipeline: normalize -> recognize -> extract -> evaluate

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::document::RawDocument;
use super::report::{DocumentReport, PipelineOutput};
use crate::config::{ConfigError, PipelineConfig};
use crate::errors::PipelineError;
use crate::extraction::{build_generator, FieldExtractor, TextGenerator};
use crate::performance::evaluate;
use crate::recognition::{build_recognizer, RecognitionAdapter, TextRecognizer};
use crate::vision::normalize_blocking;

/// A configured pipeline; cheap to clone and share across tasks
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) config: Arc<PipelineConfig>,
    pub(crate) recognition: Arc<RecognitionAdapter>,
    pub(crate) extractor: Arc<FieldExtractor>,
}

impl Pipeline {
    /// Build a pipeline around explicit providers
    pub fn new(
        config: PipelineConfig,
        recognizer: Arc<dyn TextRecognizer>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let recognition = RecognitionAdapter::new(recognizer, config.recognition_timeout(), config.retry);
        let extractor = FieldExtractor::new(
            generator,
            config.max_prompt_text_chars,
            config.extraction_timeout(),
            config.retry,
        );

        info!(
            "Pipeline ready: recognition={}, extraction={}, {} fields",
            recognition.provider_name(),
            extractor.provider_name(),
            config.schema.len()
        );

        Ok(Self {
            config: Arc::new(config),
            recognition: Arc::new(recognition),
            extractor: Arc::new(extractor),
        })
    }

    /// Build a pipeline with the providers named in `config`
    pub fn from_config(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let recognizer = build_recognizer(&config)?;
        let generator = build_generator(&config)?;
        Self::new(config, recognizer, generator)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one document through every stage
    ///
    /// Transport failures in recognition or extraction end the run with an
    /// error. An unparseable extraction reply does not: it is carried in the
    /// output's `extraction_result`.
    pub async fn run(&self, raw: &RawDocument) -> Result<PipelineOutput, PipelineError> {
        let start = Instant::now();
        info!("Processing {} ({} bytes)", raw.source_id, raw.bytes.len());

        let normalized = normalize_blocking(raw.bytes.clone()).await;

        let transcript = self
            .recognition
            .recognize(&normalized.bytes)
            .await
            .map_err(PipelineError::Recognition)?;

        let extraction_result = self
            .extractor
            .extract(&transcript, &self.config.schema)
            .await
            .map_err(PipelineError::Extraction)?;

        if let Some(parse_error) = &extraction_result.parse_error {
            warn!("{}: extraction reply unparseable: {}", raw.source_id, parse_error);
        }

        let processing_time = start.elapsed().as_secs_f64();
        let performance_report = evaluate(processing_time, &extraction_result, &self.config.targets);

        info!(
            "Processed {} in {:.2}s: extraction rate {:.0}%, mvp={}, rc={}",
            raw.source_id,
            processing_time,
            performance_report.accuracy.extraction_rate * 100.0,
            performance_report.tier_results.mvp,
            performance_report.tier_results.rc
        );

        Ok(PipelineOutput {
            transcript,
            extraction_result,
            performance_report,
            preprocessed: normalized.preprocessed,
        })
    }

    /// Run one document and always return a report
    pub async fn process_document(&self, raw: &RawDocument) -> DocumentReport {
        let start = Instant::now();
        match self.run(raw).await {
            Ok(output) => DocumentReport::succeeded(&raw.source_id, output, self.config.preview_chars),
            Err(e) => {
                error!("Processing {} failed: {}", raw.source_id, e);
                DocumentReport::failed(&raw.source_id, &e, start.elapsed().as_secs_f64())
            }
        }
    }
}
