// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PipelineConfig;
use crate::pipeline::{Pipeline, RawDocument};

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Document file or directory of documents
    pub path: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "OCR_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// TOML configuration file
    #[arg(long, env = "OCR_CONFIG")]
    pub config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

/// Whether `path` names a directory, checked without blocking the runtime
async fn is_directory(path: &Path) -> Result<bool> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(metadata.is_dir())
}

async fn write_report<T: Serialize>(report: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn process(args: ProcessArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(config)?;

    if is_directory(&args.path).await? {
        let report = pipeline.run_directory(&args.path).await?;
        write_report(&report, args.output.as_deref()).await?;
        println!(
            "✅ {}/{} documents processed ({:.1}% success), mean {:.2}s",
            report.succeeded,
            report.total,
            report.success_rate * 100.0,
            report.timing.mean
        );
        return Ok(());
    }

    let doc = RawDocument::from_path(&args.path, pipeline.config().max_document_bytes).await?;
    let report = pipeline.process_document(&doc).await;
    write_report(&report, args.output.as_deref()).await?;

    if report.success {
        Ok(())
    } else {
        Err(anyhow!(
            "processing {} failed: {}",
            report.source_id,
            report.error.unwrap_or_default()
        ))
    }
}

pub async fn check(args: CheckArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(config)?;

    let report = pipeline.check_connectivity().await;
    write_report(&report, None).await?;

    if report.all_ok() {
        println!("✅ All services reachable");
        Ok(())
    } else {
        Err(anyhow!("one or more services are unreachable"))
    }
}
