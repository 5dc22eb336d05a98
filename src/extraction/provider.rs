// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generative text provider trait

use async_trait::async_trait;

use crate::errors::TransportError;

/// Trait for generative text-completion backends
///
/// Any backend that turns a prompt into a single text completion satisfies
/// the extractor; the completion is treated as opaque text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, returning the raw reply text
    async fn complete(&self, prompt: &str) -> Result<String, TransportError>;

    /// Provider name for logging and reports
    fn name(&self) -> &'static str;
}
