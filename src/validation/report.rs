//! Diagnostics and the per-run report threaded through every pass.

use super::ledger::Ledger;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Stable machine-readable diagnostic codes.
///
/// The `SCREAMING_SNAKE_CASE` name is the single spelling used by `Display`,
/// `FromStr` and serde.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(into = "&'static str", try_from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Input
    NoPayload,
    UnclosedFence,
    ParseError,
    FileNotFound,
    FilePermissionDenied,
    FileIsDirectory,
    FileIoError,
    InvalidEncoding,

    // Structure
    RootNotMapping,
    MetaNotMapping,
    DuplicateKey,
    InvalidName,
    InvalidGoal,
    InvalidPurpose,
    InvalidSpec,
    InvalidVersion,

    // Domains
    DomainsMissing,
    DomainsNotSequence,
    DomainsEmpty,
    DomainNotString,
    DomainFormat,
    DomainDepth,
    DomainCount,
    DomainOverlap,

    // References
    ReferenceFormat,
    ReferenceUnresolved,
    CircularReference,
    RefsNotMapping,
    RefsKeyUnknown,
    RefsPathMissing,
    UnusedRefsEntry,
    ExternalFileNotFound,
    ExternalPermissionDenied,
    ExternalIsDirectory,
    ExternalIoError,
    ExternalParseError,
    ExternalReferenceUnresolved,

    // Legacy constructs
    MergeKeyNotAllowed,
    AliasNotAllowed,

    // Values
    InvalidBoolean,
    EmptyText,
    LiteralTooLong,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl TryFrom<String> for DiagnosticCode {
    type Error = strum::ParseError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Property path or other locator, when one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Property paths forming a reference cycle, first node repeated at the end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            context: None,
            cycle: None,
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.is_empty()).then_some(context);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Ledger plus diagnostics accumulated across passes.
#[derive(Debug, Default)]
pub struct Report {
    pub ledger: Ledger,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(
            "{} {}: {}",
            diagnostic.code,
            diagnostic.context.as_deref().unwrap_or("-"),
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, context: &str) {
        self.push(Diagnostic::error(code, message).with_context(context));
    }

    pub fn warning(&mut self, code: DiagnosticCode, message: impl Into<String>, context: &str) {
        self.push(Diagnostic::warning(code, message).with_context(context));
    }

    pub fn fix(&mut self, description: impl Into<String>) {
        self.ledger.record(description);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }
}
