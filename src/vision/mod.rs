// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Page image handling
//!
//! This module provides:
//! - Format sniffing, decoding and PNG re-encoding
//! - Page normalization (grayscale, median denoise, adaptive binarization)
//! - A client for OpenAI-compatible vision/chat services

pub mod image_utils;
pub mod normalize;
pub mod vlm_client;

pub use image_utils::{decode_image_bytes, detect_format, detect_mime_type, ImageError, ImageInfo};
pub use normalize::{normalize, normalize_blocking, NormalizedImage};
pub use vlm_client::VlmClient;
