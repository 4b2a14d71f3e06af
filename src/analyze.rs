//! One-shot analysis of a local file.
//!
//! Runs the same extraction chain as `POST /api/analyze` and prints the
//! six fields as pretty JSON on stdout. The tier that produced them goes
//! to the log on stderr.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::extractor::{Analysis, ExtractionService};
use crate::models::Document;

/// Read `path` and run it through the extraction chain.
///
/// With `heuristic_only`, the remote tier is skipped even when a
/// credential is configured.
pub async fn analyze_file(config: &Config, path: &Path, heuristic_only: bool) -> Result<Analysis> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let document = Document::from_bytes(&bytes);

    let service = if heuristic_only {
        ExtractionService::heuristic_only()
    } else {
        ExtractionService::from_config(&config.extractor)
    };

    Ok(service.analyze(&document.text).await)
}

/// CLI entry point — analyzes the file and prints JSON to stdout.
pub async fn run_analyze(config: &Config, path: &Path, heuristic_only: bool) -> Result<()> {
    let analysis = analyze_file(config, path, heuristic_only).await?;
    info!(source = analysis.source.as_str(), "extraction complete");

    println!("{}", serde_json::to_string_pretty(&analysis.result)?);
    Ok(())
}
