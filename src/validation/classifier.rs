//! Value classification.
//!
//! Every scalar value in a document falls into exactly one [`ValueKind`].
//! Precedence is fixed: a leading unescaped `*` always means a reference,
//! then plain nulls, then boolean-prefixed keys, then plain numbers and booleans, then the
//! literal/descriptive split by shape.

use super::shared::{is_camel_case, is_dotted_path, is_file_path, is_number, is_url};
use crate::config::EngineConfig;
use crate::document::{Scalar, ScalarStyle};
use serde::Serialize;

/// Key prefixes that mark a property as boolean (`isEnabled`, `hasTests`).
pub const BOOLEAN_PREFIXES: &[&str] = &[
    "has", "is", "can", "should", "must", "allows", "requires", "contains",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Reference,
    /// Plain `null`, `~` or an absent value.
    Null,
    Boolean,
    Number,
    Literal,
    Descriptive,
}

/// Limits that decide whether a value is short enough to be a literal.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierLimits {
    pub literal_max_length: usize,
}

impl From<&EngineConfig> for ClassifierLimits {
    fn from(config: &EngineConfig) -> Self {
        Self {
            literal_max_length: config.literal_max_length,
        }
    }
}

impl Default for ClassifierLimits {
    fn default() -> Self {
        (&EngineConfig::default()).into()
    }
}

/// True when `key` starts with a boolean prefix that ends at a word boundary.
///
/// `isEnabled`, `is_enabled` and `has` qualify; `issue`, `hash` and
/// `canonical` don't.
pub fn is_boolean_key(key: &str) -> bool {
    BOOLEAN_PREFIXES.iter().any(|prefix| {
        let Some(head) = key.get(..prefix.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            return false;
        }
        match key[prefix.len()..].chars().next() {
            None => true,
            Some(c) => !c.is_ascii_lowercase(),
        }
    })
}

/// Map a boolean-like spelling to a boolean, case-insensitively.
pub fn coerce_boolean(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// A reference starts with `*`; `\*` is an escaped literal asterisk.
pub fn is_reference_text(text: &str) -> bool {
    text.trim_start().starts_with('*')
}

/// True if `text` has the shape of a literal identifier: a camelCase word,
/// a short dotted path, or a file path.
pub fn has_literal_shape(text: &str, limits: &ClassifierLimits) -> bool {
    if text.is_empty()
        || text.chars().count() > limits.literal_max_length
        || text.contains(char::is_whitespace)
        || is_url(text)
    {
        return false;
    }
    is_camel_case(text) || is_dotted_path(text) || is_file_path(text)
}

/// Classify the scalar stored under `key`.
pub fn classify(key: &str, scalar: &Scalar, limits: &ClassifierLimits) -> ValueKind {
    let text = scalar.value.as_str();
    if is_reference_text(text) {
        return ValueKind::Reference;
    }
    if scalar.is_null() {
        return ValueKind::Null;
    }
    if is_boolean_key(key) {
        return ValueKind::Boolean;
    }
    if scalar.style == ScalarStyle::Plain {
        if is_number(text) {
            return ValueKind::Number;
        }
        if matches!(text, "true" | "false" | "True" | "False" | "TRUE" | "FALSE") {
            return ValueKind::Boolean;
        }
    }
    if scalar.style.is_block() {
        return ValueKind::Descriptive;
    }
    if has_literal_shape(text, limits) {
        ValueKind::Literal
    } else {
        ValueKind::Descriptive
    }
}
