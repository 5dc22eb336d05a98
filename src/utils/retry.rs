// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded retry for external service calls
//!
//! Only transport failures are retried, and at most once. A well-formed
//! response that fails to parse never reaches this layer as an error.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::errors::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure (clamped to `MAX_RETRIES`)
    pub max_retries: u32,
    /// Fixed delay before the retry
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Upper bound on retries regardless of configuration
    pub const MAX_RETRIES: u32 = 1;

    /// Policy with no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay_ms: 0,
        }
    }

    /// Total attempts including the first one
    pub fn attempts(&self) -> u32 {
        self.max_retries.min(Self::MAX_RETRIES) + 1
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Run `op` under `call_timeout`, retrying transport failures per `policy`
///
/// A timeout is reported as `TransportError::Timeout` and is retried like any
/// other transport failure.
pub async fn with_transport_retry<T, F, Fut>(
    policy: &RetryPolicy,
    call_timeout: Duration,
    service: &str,
    mut op: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        let result = match timeout(call_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                service: service.to_string(),
                timeout_ms: call_timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(
                    "{} attempt {}/{} failed: {}, retrying in {}ms",
                    service, attempt, attempts, e, policy.delay_ms
                );
                attempt += 1;
                sleep(policy.delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}
