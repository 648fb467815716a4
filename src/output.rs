//! Output formatting for validation results.
//!
//! - Terminal: colored verdict per file, then corrections, errors and warnings
//! - JSON: one array of `{ path, result }` objects for machine consumption

use crate::engine::ValidationResult;
use crate::validation::{Diagnostic, Severity};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

/// One validated file and its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    #[serde(flatten)]
    pub result: ValidationResult,
}

impl FileResult {
    pub fn new(path: impl Into<String>, result: ValidationResult) -> Self {
        Self {
            path: path.into(),
            result,
        }
    }
}

pub fn format_json(files: &[FileResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(files)?)
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    let mut line = format!("│  {} [{}] {}", label, diagnostic.code.as_str().bright_white(), diagnostic.message);
    if let Some(context) = &diagnostic.context {
        line.push_str(&format!(" {}", format!("({})", context).dimmed()));
    }
    // Parse errors carry multi-line source context.
    line.replace('\n', "\n│     ")
}

pub fn format_terminal(files: &[FileResult]) -> String {
    let mut output = String::new();

    for file in files {
        let result = &file.result;
        let verdict = if result.valid {
            "✓ valid".green().bold()
        } else {
            "✗ invalid".red().bold()
        };
        output.push_str(&format!("├─ {} {}\n", file.path.bright_white(), verdict));

        if !result.corrections.is_empty() {
            output.push_str(&format!("│  {} correction(s):\n", result.corrections.len()));
            for correction in &result.corrections {
                output.push_str(&format!("│    {} {}\n", "~".cyan(), correction));
            }
        }
        for diagnostic in result.errors().chain(result.warnings()) {
            output.push_str(&format_diagnostic(diagnostic));
            output.push('\n');
        }
        output.push_str("│\n");
    }

    output.push_str(&format_summary(files));
    output
}

fn format_summary(files: &[FileResult]) -> String {
    let invalid = files.iter().filter(|f| !f.result.valid).count();
    let corrected = files.iter().filter(|f| !f.result.corrections.is_empty()).count();
    let errors: usize = files.iter().map(|f| f.result.errors().count()).sum();
    let warnings: usize = files.iter().map(|f| f.result.warnings().count()).sum();

    let headline = if invalid == 0 {
        format!("{} file(s) valid", files.len()).green().bold()
    } else {
        format!("{} of {} file(s) invalid", invalid, files.len()).red().bold()
    };
    format!(
        "└─ {} ({} error(s), {} warning(s), {} file(s) with corrections)\n",
        headline, errors, warnings, corrected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::DiagnosticCode;

    fn result(valid: bool, diagnostics: Vec<Diagnostic>) -> ValidationResult {
        ValidationResult {
            valid,
            corrections: vec!["Added missing $meta section".to_string()],
            corrected_text: Some("$meta: {}\n".to_string()),
            diagnostics,
        }
    }

    #[test]
    fn test_format_json_uses_camel_case_fields() {
        let files = vec![FileResult::new(
            "a.md",
            result(
                false,
                vec![Diagnostic::error(DiagnosticCode::DomainsEmpty, "empty").with_context("$meta.domains")],
            ),
        )];
        let json = format_json(&files).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["path"], "a.md");
        assert_eq!(value[0]["valid"], false);
        assert_eq!(value[0]["correctedText"], "$meta: {}\n");
        assert_eq!(value[0]["diagnostics"][0]["code"], "DOMAINS_EMPTY");
        assert_eq!(value[0]["diagnostics"][0]["severity"], "error");
        assert_eq!(value[0]["diagnostics"][0]["context"], "$meta.domains");
    }

    #[test]
    fn test_format_terminal_lists_everything() {
        colored::control::set_override(false);
        let files = vec![
            FileResult::new(
                "a.md",
                result(
                    false,
                    vec![
                        Diagnostic::warning(DiagnosticCode::UnusedRefsEntry, "unused"),
                        Diagnostic::error(DiagnosticCode::ReferenceUnresolved, "missing"),
                    ],
                ),
            ),
            FileResult::new("b.md", result(true, Vec::new())),
        ];
        let text = format_terminal(&files);
        assert!(text.contains("a.md ✗ invalid"));
        assert!(text.contains("b.md ✓ valid"));
        assert!(text.contains("Added missing $meta section"));
        // Errors are listed before warnings.
        let error_at = text.find("REFERENCE_UNRESOLVED").unwrap();
        let warning_at = text.find("UNUSED_REFS_ENTRY").unwrap();
        assert!(error_at < warning_at);
        assert!(text.contains("1 of 2 file(s) invalid"));
    }
}
