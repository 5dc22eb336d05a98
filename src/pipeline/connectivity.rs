// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reachability check for the two external services

use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

use super::orchestrator::Pipeline;
use crate::recognition::{RecognitionResponse, Transcript};
use crate::vision::image_utils::encode_png;

const PROBE_TEXT: &str = "これはテストです";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub provider: String,
    pub status: ServiceState,
    pub message: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub recognition: ServiceStatus,
    pub extraction: ServiceStatus,
}

impl ConnectivityReport {
    pub fn all_ok(&self) -> bool {
        self.recognition.status == ServiceState::Ok && self.extraction.status == ServiceState::Ok
    }
}

fn probe_image() -> Result<Vec<u8>, String> {
    let white = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
    encode_png(&DynamicImage::ImageRgb8(white)).map_err(|e| e.to_string())
}

impl Pipeline {
    /// Send a blank page to the recognizer and a short text to the generator
    ///
    /// Never fails; each service's outcome is reported separately.
    pub async fn check_connectivity(&self) -> ConnectivityReport {
        let recognition = self.check_recognition().await;
        let extraction = self.check_extraction().await;

        let report = ConnectivityReport {
            recognition,
            extraction,
        };
        if report.all_ok() {
            info!("Connectivity check passed");
        } else {
            warn!("Connectivity check failed: {:?}", report);
        }
        report
    }

    async fn check_recognition(&self) -> ServiceStatus {
        let provider = self.recognition.provider_name().to_string();
        let start = Instant::now();

        let outcome = match probe_image() {
            Ok(image) => self
                .recognition
                .recognize(&image)
                .await
                .map(|_| "recognition service reachable".to_string())
                .map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        status(provider, outcome, start)
    }

    async fn check_extraction(&self) -> ServiceStatus {
        let provider = self.extractor.provider_name().to_string();
        let start = Instant::now();

        let transcript = Transcript::from_response(
            RecognitionResponse {
                text: PROBE_TEXT.to_string(),
                words: Vec::new(),
            },
            0,
        );
        let outcome = self
            .extractor
            .extract(&transcript, &self.config.schema)
            .await
            .map(|result| match result.parse_error {
                Some(e) => format!("extraction service reachable, reply unparseable: {}", e),
                None => "extraction service reachable".to_string(),
            })
            .map_err(|e| e.to_string());
        status(provider, outcome, start)
    }
}

fn status(provider: String, outcome: Result<String, String>, start: Instant) -> ServiceStatus {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(message) => ServiceStatus {
            provider,
            status: ServiceState::Ok,
            message,
            elapsed_ms,
        },
        Err(message) => ServiceStatus {
            provider,
            status: ServiceState::Error,
            message,
            elapsed_ms,
        },
    }
}
