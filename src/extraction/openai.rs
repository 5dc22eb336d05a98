// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI-compatible chat completion provider

use async_trait::async_trait;

use super::provider::TextGenerator;
use crate::errors::TransportError;
use crate::vision::VlmClient;

pub struct OpenAiGenerator {
    client: VlmClient,
}

impl OpenAiGenerator {
    pub fn new(client: VlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        self.client.complete(prompt).await
    }

    fn name(&self) -> &'static str {
        self.client.service()
    }
}
