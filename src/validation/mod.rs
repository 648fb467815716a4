//! Validation passes for rule documents.
//!
//! Each pass takes ownership of the [`Document`](crate::document::Document),
//! records diagnostics and corrections on a shared [`Report`], and hands the
//! (possibly corrected) tree back. The engine runs them in a fixed order:
//!
//! - [`structure`]: root shape, `$meta` placement, required fields, duplicate keys
//! - [`domains`]: `$meta.domains` tag grammar, count and overlap
//! - [`references`]: legacy constructs, reference grammar and resolution, cycles
//! - [`values`]: boolean coercion, literal/descriptive quoting, empty text
//! - [`legacy`]: merge-key and alias handling
//! - [`layout`]: flow vs. block rendering of containers

pub mod classifier;
mod cycles;
mod domains;
pub(crate) mod layout;
pub(crate) mod legacy;
mod ledger;
pub(crate) mod references;
mod report;
mod shared;
pub(crate) mod structure;
pub(crate) mod values;

pub use classifier::{classify, ClassifierLimits, ValueKind};
pub use ledger::Ledger;
pub use report::{Diagnostic, DiagnosticCode, Report, Severity};
pub use structure::{META_KEY, REFS_KEY};
