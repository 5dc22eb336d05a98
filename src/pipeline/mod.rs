// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline orchestration, batch mode and reports

pub mod batch;
pub mod connectivity;
pub mod document;
pub mod orchestrator;
pub mod report;

pub use connectivity::{ConnectivityReport, ServiceState, ServiceStatus};
pub use document::{is_supported_document, list_documents, RawDocument, SUPPORTED_EXTENSIONS};
pub use orchestrator::Pipeline;
pub use report::{BatchReport, DocumentReport, FailedDocument, PipelineOutput};
