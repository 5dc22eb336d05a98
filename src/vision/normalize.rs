// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Page normalization ahead of text recognition
//!
//! Steps, in order:
//! 1. Decode the page (magic-byte format detection)
//! 2. Convert to 8-bit grayscale
//! 3. Denoise with a 3x3 median filter
//! 4. Binarize with an adaptive Gaussian threshold (block 11, C = 2)
//! 5. Re-encode as PNG
//!
//! Any failure returns the original bytes untouched; normalization never
//! fails a pipeline run.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use tracing::{debug, warn};

use super::image_utils::{decode_image_bytes, detect_mime_type, encode_png, ImageError};

/// Neighbourhood size of the adaptive threshold
pub const THRESHOLD_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the local mean
pub const THRESHOLD_C: i16 = 2;

/// Median filter radius (radius 1 is a 3x3 window)
pub const MEDIAN_RADIUS: u32 = 1;

/// Result of normalizing one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Bytes handed to the recognizer
    pub bytes: Vec<u8>,
    /// False when the original bytes were passed through
    pub preprocessed: bool,
    pub mime_type: &'static str,
    /// Pixel dimensions when the page could be decoded
    pub dimensions: Option<(u32, u32)>,
}

impl NormalizedImage {
    fn passthrough(raw: &[u8]) -> Self {
        Self {
            bytes: raw.to_vec(),
            preprocessed: false,
            mime_type: detect_mime_type(raw),
            dimensions: None,
        }
    }
}

/// Normalize a raw page, falling back to the input on any failure
pub fn normalize(raw: &[u8]) -> NormalizedImage {
    match normalize_bytes(raw) {
        Ok((bytes, dimensions)) => {
            debug!(
                "Normalized page {}x{}: {} -> {} bytes",
                dimensions.0,
                dimensions.1,
                raw.len(),
                bytes.len()
            );
            NormalizedImage {
                bytes,
                preprocessed: true,
                mime_type: "image/png",
                dimensions: Some(dimensions),
            }
        }
        Err(e) => {
            warn!("Image normalization failed, using original bytes: {}", e);
            NormalizedImage::passthrough(raw)
        }
    }
}

/// Normalize on the blocking pool so the async executor is not stalled
pub async fn normalize_blocking(raw: Vec<u8>) -> NormalizedImage {
    let fallback = raw.clone();
    match tokio::task::spawn_blocking(move || normalize(&raw)).await {
        Ok(normalized) => normalized,
        Err(e) => {
            warn!(
                "Image normalization failed, using original bytes: {}",
                ImageError::TaskFailed(e.to_string())
            );
            NormalizedImage::passthrough(&fallback)
        }
    }
}

/// Decode, transform and re-encode; errors are surfaced to `normalize`
pub fn normalize_bytes(raw: &[u8]) -> Result<(Vec<u8>, (u32, u32)), ImageError> {
    let (img, info) = decode_image_bytes(raw)?;
    let gray = to_grayscale(&img);

    // An already binarized page is only re-encoded, which keeps a second
    // pass byte-identical to the first.
    let binary = if is_bilevel(&gray) {
        gray
    } else {
        adaptive_gaussian_threshold(&denoise(&gray), THRESHOLD_BLOCK_SIZE, THRESHOLD_C)
    };

    let bytes = encode_png(&DynamicImage::ImageLuma8(binary))?;
    Ok((bytes, (info.width, info.height)))
}

pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

pub fn denoise(image: &GrayImage) -> GrayImage {
    median_filter(image, MEDIAN_RADIUS, MEDIAN_RADIUS)
}

/// Gaussian sigma matching a square block of `block_size` pixels
fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Binarize against the Gaussian-weighted local mean minus `c`
///
/// A pixel becomes white (255) when it is brighter than its local threshold,
/// black (0) otherwise.
pub fn adaptive_gaussian_threshold(image: &GrayImage, block_size: u32, c: i16) -> GrayImage {
    let local_mean = gaussian_blur_f32(image, block_sigma(block_size));

    let mut output = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let threshold = local_mean.get_pixel(x, y)[0] as i16 - c;
        let value = if pixel[0] as i16 > threshold { 255 } else { 0 };
        output.put_pixel(x, y, Luma([value]));
    }
    output
}

/// True when every pixel is pure black or pure white
pub fn is_bilevel(image: &GrayImage) -> bool {
    image.pixels().all(|p| p[0] == 0 || p[0] == 255)
}
