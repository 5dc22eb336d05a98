// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition provider trait

use async_trait::async_trait;

use super::types::RecognitionResponse;
use crate::errors::TransportError;

/// Trait for text recognition backends
///
/// A backend that is reachable but finds no text returns an empty
/// `RecognitionResponse`; only failures to talk to the service are errors.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text on one page image
    async fn annotate(&self, image: &[u8]) -> Result<RecognitionResponse, TransportError>;

    /// Provider name for logging and reports
    fn name(&self) -> &'static str;
}
