// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for OpenAI-compatible chat completion services
//!
//! Used for page transcription by a vision-language sidecar and for
//! plain-text completion by a local generative model.

use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::errors::TransportError;
use crate::utils::http::{build_client, decode_json, ensure_success};
use crate::vision::image_utils::to_data_url;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

const TRANSCRIBE_PROMPT: &str = "この画像に含まれるすべてのテキストを抽出してください。元のレイアウトと改行をできるだけ保ち、抽出したテキストのみを返してください。テキストが無い場合は空文字を返してください。";

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint
pub struct VlmClient {
    client: Client,
    endpoint: String,
    model_name: String,
    api_key: Option<String>,
    service: &'static str,
    timeout_ms: u64,
    max_tokens: u32,
    temperature: f32,
}

impl VlmClient {
    pub fn new(
        service: &'static str,
        endpoint: &str,
        model_name: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = build_client(timeout)?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "{} client configured: endpoint={}, model={}",
            service, endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
            api_key: None,
            service,
            timeout_ms: timeout.as_millis() as u64,
            max_tokens: 4096,
            temperature: 0.1,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Transcribe all text on a page image
    pub async fn transcribe(&self, image: &[u8]) -> Result<String, TransportError> {
        let content = serde_json::json!([
            {"type": "text", "text": TRANSCRIBE_PROMPT},
            {"type": "image_url", "image_url": {"url": to_data_url(image)}}
        ]);
        self.chat(content).await
    }

    /// Complete a plain-text prompt
    pub async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        self.chat(serde_json::Value::String(prompt.to_string())).await
    }

    async fn chat(&self, content: serde_json::Value) -> Result<String, TransportError> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.model_name.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(self.service, e, self.timeout_ms))?;
        let response = ensure_success(self.service, response).await?;
        let chat_response: ChatResponse = decode_json(self.service, response).await?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let tokens_used = chat_response.usage.map(|u| u.total_tokens).unwrap_or(0);

        debug!(
            "{} completion from {}: {} chars, {} tokens, {}ms",
            self.service,
            self.model_name,
            text.chars().count(),
            tokens_used,
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
