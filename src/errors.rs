// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types shared by the recognition and extraction stages

use thiserror::Error;

/// Failure talking to an external service (recognition or extraction)
///
/// A transport error is fatal for the document it belongs to. It is distinct
/// from an empty recognition result and from an unparseable extraction
/// response, both of which are recorded outcomes rather than errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// Request did not complete within the configured timeout
    #[error("{service} request timed out after {timeout_ms}ms")]
    Timeout { service: String, timeout_ms: u64 },

    /// Service answered with a non-success HTTP status
    #[error("{service} returned HTTP {status}: {message}")]
    Http {
        service: String,
        status: u16,
        message: String,
    },

    /// Connection could not be established or was interrupted
    #[error("{service} network error: {message}")]
    Network { service: String, message: String },

    /// Service answered 2xx but reported an error object in the body
    #[error("{service} reported an error: {message}")]
    Api { service: String, message: String },

    /// Service envelope could not be decoded
    #[error("{service} response could not be decoded: {message}")]
    Decode { service: String, message: String },
}

impl TransportError {
    /// Name of the service the error came from
    pub fn service(&self) -> &str {
        match self {
            TransportError::Timeout { service, .. }
            | TransportError::Http { service, .. }
            | TransportError::Network { service, .. }
            | TransportError::Api { service, .. }
            | TransportError::Decode { service, .. } => service,
        }
    }

    /// Short machine-readable kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "timeout",
            TransportError::Http { .. } => "http",
            TransportError::Network { .. } => "network",
            TransportError::Api { .. } => "api",
            TransportError::Decode { .. } => "decode",
        }
    }

    /// Classify a reqwest failure
    pub fn from_reqwest(service: &str, err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                service: service.to_string(),
                timeout_ms,
            }
        } else if err.is_decode() {
            TransportError::Decode {
                service: service.to_string(),
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            TransportError::Http {
                service: service.to_string(),
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            TransportError::Network {
                service: service.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Failure of a single document's pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("text recognition failed: {0}")]
    Recognition(#[source] TransportError),

    #[error("field extraction failed: {0}")]
    Extraction(#[source] TransportError),

    #[error("could not read document {source_id}: {message}")]
    Input { source_id: String, message: String },
}

impl PipelineError {
    /// Short machine-readable kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Recognition(_) => "recognition_transport",
            PipelineError::Extraction(_) => "extraction_transport",
            PipelineError::Input { .. } => "input",
        }
    }
}
