//! Per-value type checks and quoting normalization.

use super::classifier::{classify, coerce_boolean, is_boolean_key, ClassifierLimits, ValueKind};
use super::legacy::MERGE_KEY;
use super::report::{DiagnosticCode, Report};
use super::shared::{child_path, compound_word_count, is_file_path, item_path};
use super::structure::{META_KEY, REQUIRED_META_FIELDS};
use crate::config::EngineConfig;
use crate::document::{Document, Node, Scalar, ScalarStyle};

struct ValueChecker<'c> {
    limits: ClassifierLimits,
    max_words: usize,
    report: &'c mut Report,
}

/// Classify every scalar value and enforce its kind.
///
/// Booleans are coerced, literals are single-quoted and descriptive text is
/// double-quoted. Word-count overflow and empty text are reported, not fixed.
pub(crate) fn check_values(mut doc: Document, report: &mut Report, config: &EngineConfig) -> Document {
    let mut checker = ValueChecker {
        limits: ClassifierLimits::from(config),
        max_words: config.literal_max_words,
        report,
    };
    checker.visit(&mut doc.root, "", "");
    doc
}

impl ValueChecker<'_> {
    fn visit(&mut self, node: &mut Node, path: &str, key: &str) {
        match node {
            Node::Mapping(m) => {
                for entry in &mut m.entries {
                    if entry.key.value == MERGE_KEY {
                        continue;
                    }
                    let child = child_path(path, &entry.key.value);
                    self.visit(&mut entry.value, &child, &entry.key.value);
                }
            }
            Node::Sequence(s) => {
                // Items take the key of the property holding the sequence.
                for (i, item) in s.items.iter_mut().enumerate() {
                    self.visit(&mut item.value, &item_path(path, i), key);
                }
            }
            Node::Scalar(scalar) => self.check_scalar(scalar, path, key),
            Node::Alias(_) => {}
        }
    }

    fn check_scalar(&mut self, scalar: &mut Scalar, path: &str, key: &str) {
        if is_structural_meta_value(path) {
            return;
        }
        match classify(key, scalar, &self.limits) {
            ValueKind::Reference | ValueKind::Null | ValueKind::Number => {}
            ValueKind::Boolean => self.check_boolean(scalar, path, key),
            ValueKind::Literal => {
                if !is_file_path(&scalar.value) {
                    self.check_word_count(scalar, path);
                }
                if scalar.style != ScalarStyle::SingleQuoted {
                    let from = scalar.style.describe();
                    scalar.style = ScalarStyle::SingleQuoted;
                    self.report
                        .fix(format!("Converted {} from {} to single-quoted literal", path, from));
                }
            }
            ValueKind::Descriptive => {
                if scalar.value.trim().is_empty() {
                    if !is_checked_meta_field(path) {
                        self.report.error(
                            DiagnosticCode::EmptyText,
                            format!("{} has no text", path),
                            path,
                        );
                    }
                    return;
                }
                if !scalar.style.is_block() && scalar.style != ScalarStyle::DoubleQuoted {
                    let from = scalar.style.describe();
                    scalar.style = ScalarStyle::DoubleQuoted;
                    self.report
                        .fix(format!("Converted {} from {} to double-quoted text", path, from));
                }
            }
        }
    }

    fn check_boolean(&mut self, scalar: &mut Scalar, path: &str, key: &str) {
        if !is_boolean_key(key) {
            // Plain `true`/`false` under an ordinary key.
            return;
        }
        if scalar.style == ScalarStyle::Plain && matches!(scalar.value.as_str(), "true" | "false") {
            return;
        }
        match coerce_boolean(&scalar.value) {
            Some(value) => {
                self.report.fix(format!(
                    "Converted {} from '{}' to boolean {}",
                    path, scalar.value, value
                ));
                scalar.value = value.to_string();
                scalar.style = ScalarStyle::Plain;
            }
            None => self.report.error(
                DiagnosticCode::InvalidBoolean,
                format!("Boolean property {} has non-boolean value '{}'", path, scalar.value),
                path,
            ),
        }
    }

    fn check_word_count(&mut self, scalar: &Scalar, path: &str) {
        let words = scalar
            .value
            .split('.')
            .map(compound_word_count)
            .max()
            .unwrap_or(0);
        if words > self.max_words {
            self.report.error(
                DiagnosticCode::LiteralTooLong,
                format!(
                    "Literal '{}' has {} compound words, maximum is {}",
                    scalar.value, words, self.max_words
                ),
                path,
            );
        }
    }
}

fn meta_field(path: &str) -> Option<&str> {
    path.strip_prefix(META_KEY).and_then(|rest| rest.strip_prefix('.'))
}

/// `$meta` text fields whose emptiness the structural pass already reports.
fn is_checked_meta_field(path: &str) -> bool {
    meta_field(path).is_some_and(|field| REQUIRED_META_FIELDS.contains(&field))
}

/// `$meta.version` and the domain tags keep whatever form the structural
/// pass left them in, even when it reported them as invalid.
fn is_structural_meta_value(path: &str) -> bool {
    meta_field(path).is_some_and(|field| field == "version" || field.starts_with("domains["))
}
