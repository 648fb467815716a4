//! Validation engine: runs the passes in order and assembles the result.

use crate::cache::ExternalCache;
use crate::config::{AliasPolicy, EngineConfig};
use crate::document::Document;
use crate::error::{Result, RulemarkError};
use crate::error_formatting::describe_parse_error;
use crate::extract::{extract, ExtractError, Extraction, SourceKind};
use crate::loader::{DocumentLoader, FsLoader};
use crate::validation::references::{check_references, ResolveContext};
use crate::validation::{layout, legacy, structure, values};
use crate::validation::{Diagnostic, DiagnosticCode, Report, Severity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True iff no error-severity diagnostic was recorded.
    pub valid: bool,
    /// Ledger of applied corrections, in order.
    pub corrections: Vec<String>,
    /// Full corrected file text, present iff `corrections` is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_text: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    fn from_report(report: Report, corrected_text: Option<String>) -> Self {
        let valid = !report.has_errors();
        let corrections = report.ledger.into_entries();
        let corrected_text = if corrections.is_empty() { None } else { corrected_text };
        Self {
            valid,
            corrections,
            corrected_text,
            diagnostics: report.diagnostics,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.count(code) > 0
    }
}

/// Validates rule documents against the dialect.
///
/// Cheap to share across threads: the loader and external-document cache are
/// held behind `Arc` and may be shared with other engines.
pub struct Engine {
    config: EngineConfig,
    loader: Arc<dyn DocumentLoader>,
    cache: Arc<ExternalCache>,
}

impl Engine {
    /// Engine reading from the local filesystem with a fresh cache.
    pub fn new(config: EngineConfig) -> Self {
        let loader = Arc::new(FsLoader::new(config.max_file_bytes));
        Self::with_loader(config, loader, Arc::new(ExternalCache::new()))
    }

    pub fn with_loader(
        config: EngineConfig,
        loader: Arc<dyn DocumentLoader>,
        cache: Arc<ExternalCache>,
    ) -> Self {
        Self { config, loader, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ExternalCache {
        &self.cache
    }

    /// Read a file through the loader as UTF-8 text.
    pub fn read_source(&self, path: &Path) -> Result<String> {
        let bytes = self.loader.load(path)?;
        String::from_utf8(bytes).map_err(|_| RulemarkError::utf8(path))
    }

    /// Validate the file at `path`. A file that can't be read yields an
    /// invalid result carrying the I/O diagnostic.
    pub fn validate_path(&self, path: &Path) -> ValidationResult {
        match self.read_source(path) {
            Ok(text) => self.validate_text(&text, Some(path)),
            Err(err) => {
                tracing::warn!("Cannot read {}: {}", path.display(), err);
                let mut report = Report::new();
                report.error(err.code(), err.to_string(), &path.display().to_string());
                ValidationResult::from_report(report, None)
            }
        }
    }

    /// Validate document text. `source` locates the document for external
    /// reference resolution and picks Markdown or YAML extraction.
    pub fn validate_text(&self, text: &str, source: Option<&Path>) -> ValidationResult {
        let mut report = Report::new();

        let extraction = match extract(text, SourceKind::from_path(source)) {
            Ok(extraction) => extraction,
            Err(err) => {
                let code = match err {
                    ExtractError::NoPayload => DiagnosticCode::NoPayload,
                    ExtractError::UnclosedFence { .. } => DiagnosticCode::UnclosedFence,
                };
                report.error(code, err.to_string(), "");
                return ValidationResult::from_report(report, None);
            }
        };
        if extraction.fence_added {
            report.fix("Added missing yaml code fence");
        }

        let doc = match Document::parse(extraction.payload()) {
            Ok(doc) => doc,
            Err(err) => {
                report.error(
                    DiagnosticCode::ParseError,
                    describe_parse_error(&err, extraction.payload(), extraction.payload_line),
                    "",
                );
                let corrected = extraction.reassemble(extraction.payload());
                return ValidationResult::from_report(report, Some(corrected));
            }
        };

        let doc = self.run_passes(doc, &mut report, source);
        let corrected = self.corrected_text(&extraction, &doc, &report);
        ValidationResult::from_report(report, corrected)
    }

    fn run_passes(&self, doc: Document, report: &mut Report, source: Option<&Path>) -> Document {
        let doc = structure::check_structure(doc, report, &self.config);
        log_pass("structure", report);
        if doc.root_mapping().is_none() {
            return doc;
        }

        let ctx = ResolveContext {
            config: &self.config,
            source,
            loader: self.loader.as_ref(),
            cache: &self.cache,
        };
        let doc = check_references(doc, report, &ctx);
        log_pass("references", report);
        let doc = values::check_values(doc, report, &self.config);
        log_pass("values", report);
        let doc = match self.config.alias_policy {
            AliasPolicy::Convert => legacy::convert_aliases(doc, report),
            AliasPolicy::Reject => doc,
        };
        let doc = layout::normalize_layout(doc, report, self.config.layout_threshold);
        log_pass("layout", report);
        doc
    }

    fn corrected_text(&self, extraction: &Extraction, doc: &Document, report: &Report) -> Option<String> {
        if report.ledger.is_empty() {
            return None;
        }
        Some(extraction.reassemble(&doc.to_yaml_string()))
    }
}

/// Running totals after each pass.
fn log_pass(pass: &str, report: &Report) {
    tracing::debug!(
        "After {} pass: {} diagnostic(s), {} correction(s)",
        pass,
        report.diagnostics.len(),
        report.ledger.len()
    );
}
