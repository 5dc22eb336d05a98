// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared reqwest plumbing for the service adapters

use reqwest::{Client, Response};
use std::time::Duration;

use crate::errors::TransportError;

/// Longest error body kept in a `TransportError::Http` message
const MAX_ERROR_BODY_CHARS: usize = 500;

pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Turn a non-2xx response into `TransportError::Http`
pub async fn ensure_success(service: &str, response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    Err(TransportError::Http {
        service: service.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Decode a JSON envelope, classifying failures as `TransportError::Decode`
pub async fn decode_json<T: serde::de::DeserializeOwned>(
    service: &str,
    response: Response,
) -> Result<T, TransportError> {
    response.json::<T>().await.map_err(|e| TransportError::Decode {
        service: service.to_string(),
        message: format!("JSON parse error: {}", e),
    })
}
