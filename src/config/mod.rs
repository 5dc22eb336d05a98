// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline configuration
//!
//! All prompts, limits, targets and service endpoints live in an explicit
//! `PipelineConfig` handed to the orchestrator. Nothing is read from
//! process-wide state after construction.

pub mod schema;

pub use schema::{FieldSchema, SchemaError, REGISTRY_CERTIFICATE_FIELDS};

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::performance::PerformanceTargets;
use crate::utils::RetryPolicy;

const GOOGLE_VISION_ENDPOINT: &str = "https://vision.googleapis.com";
const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const VLM_ENDPOINT: &str = "http://localhost:8081";
const OPENAI_ENDPOINT: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid field schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Which text-recognition backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionProvider {
    GoogleVision,
    Vlm,
}

impl RecognitionProvider {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            RecognitionProvider::GoogleVision => GOOGLE_VISION_ENDPOINT,
            RecognitionProvider::Vlm => VLM_ENDPOINT,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "google_vision" | "vision" | "google" => Some(Self::GoogleVision),
            "vlm" => Some(Self::Vlm),
            _ => None,
        }
    }
}

/// Google Vision detection feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisionFeature {
    TextDetection,
    DocumentTextDetection,
}

impl VisionFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisionFeature::TextDetection => "TEXT_DETECTION",
            VisionFeature::DocumentTextDetection => "DOCUMENT_TEXT_DETECTION",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "TEXT_DETECTION" => Some(Self::TextDetection),
            "DOCUMENT_TEXT_DETECTION" => Some(Self::DocumentTextDetection),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub provider: RecognitionProvider,
    /// Unset means the provider's default endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub feature: VisionFeature,
    /// Model name (VLM provider only)
    pub model: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            provider: RecognitionProvider::GoogleVision,
            endpoint: None,
            api_key: None,
            feature: VisionFeature::TextDetection,
            model: "qwen3-vl".to_string(),
        }
    }
}

impl RecognitionConfig {
    /// Configured endpoint, or the provider's default
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

/// Which generative text backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionProvider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ExtractionProvider {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ExtractionProvider::Gemini => GEMINI_ENDPOINT,
            ExtractionProvider::OpenAi => OPENAI_ENDPOINT,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "openai" | "open_ai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub provider: ExtractionProvider,
    /// Unset means the provider's default endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: ExtractionProvider::Gemini,
            endpoint: None,
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.1,
            max_output_tokens: 2048,
        }
    }
}

impl ExtractionConfig {
    /// Configured endpoint, or the provider's default
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

/// Configuration for one pipeline instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fields the extractor must report
    pub schema: FieldSchema,
    /// MVP and release-candidate targets
    pub targets: PerformanceTargets,
    /// Transcript characters embedded in the extraction prompt
    pub max_prompt_text_chars: usize,
    /// Transcript characters kept in the report preview
    pub preview_chars: usize,
    pub recognition_timeout_secs: u64,
    pub extraction_timeout_secs: u64,
    pub retry: RetryPolicy,
    /// In-flight documents during batch runs
    pub max_concurrent_documents: usize,
    /// Input files larger than this are rejected at load
    pub max_document_bytes: u64,
    pub recognition: RecognitionConfig,
    pub extraction: ExtractionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: FieldSchema::default(),
            targets: PerformanceTargets::default(),
            max_prompt_text_chars: 4000,
            preview_chars: 500,
            recognition_timeout_secs: 60,
            extraction_timeout_secs: 60,
            retry: RetryPolicy::default(),
            max_concurrent_documents: 4,
            max_document_bytes: 100 * 1024 * 1024,
            recognition: RecognitionConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Timeout bounds accepted for external calls, in seconds
    pub const TIMEOUT_RANGE_SECS: (u64, u64) = (1, 300);

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a TOML file, then fill credentials and overrides from the environment
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Overlay environment variables onto the current values
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| env::var(name).ok());
    }

    /// Overlay variables from `lookup`
    ///
    /// `GOOGLE_API_KEY` only fills the key of Google-hosted providers; it is
    /// never sent to an OpenAI-compatible or VLM endpoint.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let google_key = var("GOOGLE_API_KEY");

        if let Some(provider) = var("OCR_RECOGNITION_PROVIDER")
            .and_then(|v| RecognitionProvider::parse(&v))
        {
            if provider != self.recognition.provider {
                self.recognition.endpoint = None;
            }
            self.recognition.provider = provider;
        }
        if let Some(endpoint) = var("OCR_RECOGNITION_ENDPOINT") {
            self.recognition.endpoint = Some(endpoint);
        }
        if let Some(model) = var("OCR_RECOGNITION_MODEL") {
            self.recognition.model = model;
        }
        if let Some(feature) = var("OCR_VISION_FEATURE").and_then(|v| VisionFeature::parse(&v)) {
            self.recognition.feature = feature;
        }
        if self.recognition.api_key.is_none()
            && self.recognition.provider == RecognitionProvider::GoogleVision
        {
            self.recognition.api_key = google_key.clone();
        }

        if let Some(provider) = var("OCR_EXTRACTION_PROVIDER")
            .and_then(|v| ExtractionProvider::parse(&v))
        {
            if provider != self.extraction.provider {
                self.extraction.endpoint = None;
            }
            self.extraction.provider = provider;
        }
        if let Some(endpoint) = var("OCR_EXTRACTION_ENDPOINT") {
            self.extraction.endpoint = Some(endpoint);
        }
        if let Some(model) = var("OCR_EXTRACTION_MODEL") {
            self.extraction.model = model;
        }
        if let Some(key) = var("OCR_EXTRACTION_API_KEY") {
            self.extraction.api_key = Some(key);
        }
        if self.extraction.api_key.is_none() && self.extraction.provider == ExtractionProvider::Gemini
        {
            self.extraction.api_key = google_key;
        }

        let parsed = |name: &str| var(name).and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(n) = parsed("OCR_MAX_CONCURRENT_DOCUMENTS") {
            self.max_concurrent_documents = n as usize;
        }
        if let Some(secs) = parsed("OCR_RECOGNITION_TIMEOUT_SECS") {
            self.recognition_timeout_secs = secs;
        }
        if let Some(secs) = parsed("OCR_EXTRACTION_TIMEOUT_SECS") {
            self.extraction_timeout_secs = secs;
        }
        if let Some(chars) = parsed("OCR_MAX_PROMPT_CHARS") {
            self.max_prompt_text_chars = chars as usize;
        }
        if let Some(retries) = parsed("OCR_MAX_RETRIES") {
            self.retry.max_retries = retries.min(u32::MAX as u64) as u32;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.targets.validate().map_err(ConfigError::Invalid)?;

        if self.max_concurrent_documents == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_documents must be greater than 0".to_string(),
            ));
        }
        if self.max_prompt_text_chars == 0 {
            return Err(ConfigError::Invalid(
                "max_prompt_text_chars must be greater than 0".to_string(),
            ));
        }
        if self.max_document_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_document_bytes must be greater than 0".to_string(),
            ));
        }

        let (min, max) = Self::TIMEOUT_RANGE_SECS;
        for (name, secs) in [
            ("recognition_timeout_secs", self.recognition_timeout_secs),
            ("extraction_timeout_secs", self.extraction_timeout_secs),
        ] {
            if secs < min || secs > max {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between {} and {}, got {}",
                    name, min, max, secs
                )));
            }
        }

        if self.recognition.endpoint().trim().is_empty() {
            return Err(ConfigError::Invalid(
                "recognition endpoint must not be empty".to_string(),
            ));
        }
        if self.extraction.endpoint().trim().is_empty() {
            return Err(ConfigError::Invalid(
                "extraction endpoint must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.extraction.temperature) {
            return Err(ConfigError::Invalid(format!(
                "extraction temperature must be between 0.0 and 2.0, got {}",
                self.extraction.temperature
            )));
        }

        Ok(())
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}
