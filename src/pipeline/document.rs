// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Input documents

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::PipelineError;

/// File extensions accepted when loading a directory
pub const SUPPORTED_EXTENSIONS: [&str; 9] =
    ["pdf", "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// A page to process: raw bytes plus where they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// File path or caller-assigned identifier
    pub source_id: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(source_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_id: source_id.into(),
            bytes,
        }
    }

    /// Read a document from disk, rejecting files above `max_bytes`
    pub async fn from_path(path: &Path, max_bytes: u64) -> Result<Self, PipelineError> {
        let source_id = path.display().to_string();
        let input_error = |message: String| PipelineError::Input {
            source_id: source_id.clone(),
            message,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| input_error(e.to_string()))?;
        if !metadata.is_file() {
            return Err(input_error("not a regular file".to_string()));
        }
        if metadata.len() > max_bytes {
            return Err(input_error(format!(
                "file is {} bytes, limit is {} bytes",
                metadata.len(),
                max_bytes
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| input_error(e.to_string()))?;
        debug!("Loaded {} ({} bytes)", source_id, bytes.len());
        Ok(Self::new(source_id, bytes))
    }
}

pub fn is_supported_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Supported files directly inside `dir`, sorted by name
pub async fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let input_error = |e: std::io::Error| PipelineError::Input {
        source_id: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(input_error)?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(input_error)? {
        let path = entry.path();
        if path.is_file() && is_supported_document(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
