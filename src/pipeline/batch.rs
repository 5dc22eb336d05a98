// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch processing with per-document failure isolation

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::document::{list_documents, RawDocument};
use super::orchestrator::Pipeline;
use super::report::{BatchReport, DocumentReport};
use crate::errors::PipelineError;

/// Where a batch entry's bytes come from
enum BatchInput {
    Document(RawDocument),
    Path(PathBuf),
}

impl BatchInput {
    fn source_id(&self) -> String {
        match self {
            BatchInput::Document(doc) => doc.source_id.clone(),
            BatchInput::Path(path) => path.display().to_string(),
        }
    }
}

impl Pipeline {
    /// Process documents concurrently, bounded by `max_concurrent_documents`
    ///
    /// The report has one entry per input, in input order. A failing
    /// document never affects the others.
    pub async fn run_batch(&self, documents: Vec<RawDocument>) -> BatchReport {
        self.run_inputs(documents.into_iter().map(BatchInput::Document).collect())
            .await
    }

    /// Load and process files; unreadable files become failed entries
    pub async fn run_batch_paths(&self, paths: Vec<PathBuf>) -> BatchReport {
        self.run_inputs(paths.into_iter().map(BatchInput::Path).collect())
            .await
    }

    /// Process every supported file in `dir`
    pub async fn run_directory(&self, dir: &Path) -> Result<BatchReport, PipelineError> {
        let paths = list_documents(dir).await?;
        info!("Found {} documents in {}", paths.len(), dir.display());
        Ok(self.run_batch_paths(paths).await)
    }

    async fn run_inputs(&self, inputs: Vec<BatchInput>) -> BatchReport {
        let total = inputs.len();
        let max_concurrent = self.config.max_concurrent_documents.max(1);
        info!(
            "Starting batch of {} documents ({} concurrent)",
            total, max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut source_ids = Vec::with_capacity(total);
        let mut handles = Vec::with_capacity(total);

        for input in inputs {
            let source_id = input.source_id();
            let pipeline = self.clone();
            let sem = semaphore.clone();

            let handle = tokio::spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let error = PipelineError::Input {
                            source_id: input.source_id(),
                            message: format!("worker pool closed: {}", e),
                        };
                        return DocumentReport::failed(&input.source_id(), &error, 0.0);
                    }
                };
                pipeline.process_input(input).await
            });

            source_ids.push(source_id);
            handles.push(handle);
        }

        let results = join_all(handles).await;
        let mut entries = Vec::with_capacity(total);
        for (source_id, result) in source_ids.into_iter().zip(results) {
            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    error!("Batch task for {} aborted: {}", source_id, e);
                    let error = PipelineError::Input {
                        source_id: source_id.clone(),
                        message: format!("processing task aborted: {}", e),
                    };
                    DocumentReport::failed(&source_id, &error, 0.0)
                }
            };
            entries.push(report);
        }

        let report = BatchReport::from_entries(entries);
        info!(
            "Batch complete: {}/{} succeeded, mean {:.2}s, mvp {}/{}, rc {}/{}",
            report.succeeded,
            report.total,
            report.timing.mean,
            report.mvp_passed,
            report.succeeded,
            report.rc_passed,
            report.succeeded
        );
        report
    }

    async fn process_input(&self, input: BatchInput) -> DocumentReport {
        match input {
            BatchInput::Document(doc) => self.process_document(&doc).await,
            BatchInput::Path(path) => {
                match RawDocument::from_path(&path, self.config.max_document_bytes).await {
                    Ok(doc) => self.process_document(&doc).await,
                    Err(e) => {
                        error!("Skipping {}: {}", path.display(), e);
                        DocumentReport::failed(&path.display().to_string(), &e, 0.0)
                    }
                }
            }
        }
    }
}
