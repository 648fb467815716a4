use super::shared::{collect_documents, expand_paths};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rulemark::cli::OutputFormat;
use rulemark::output::{format_json, format_terminal, FileResult};
use rulemark::Engine;
use std::fs;
use std::path::Path;

/// Validate every document under `paths`; returns true if all are valid.
pub(crate) fn run(
    engine: &Engine,
    paths: Vec<String>,
    fix: bool,
    format: OutputFormat,
) -> Result<(String, bool)> {
    let files = collect_documents(expand_paths(paths, format));
    tracing::info!("Validating {} document(s)", files.len());

    let results: Vec<FileResult> = files
        .par_iter()
        .map(|path| FileResult::new(path.as_str(), engine.validate_path(Path::new(path))))
        .collect();

    if fix {
        for file in &results {
            if let Some(text) = &file.result.corrected_text {
                fs::write(&file.path, text)
                    .with_context(|| format!("Failed to write corrections to {}", file.path))?;
                tracing::info!(
                    "Applied {} correction(s) to {}",
                    file.result.corrections.len(),
                    file.path
                );
            }
        }
    }

    let all_valid = results.iter().all(|f| f.result.valid);
    let rendered = match format {
        OutputFormat::Json => format_json(&results)?,
        OutputFormat::Terminal => format_terminal(&results),
    };
    Ok((rendered, all_valid))
}
