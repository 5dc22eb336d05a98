// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod http;
pub mod retry;

pub use retry::{with_transport_retry, RetryPolicy};
