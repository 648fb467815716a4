//! Shared helpers for the validation passes: name grammars and path rendering.

use std::sync::OnceLock;

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn camel_case_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("valid regex"))
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn dotted_path_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^[a-z][a-zA-Z0-9]*(\.[a-z][a-zA-Z0-9]*){1,3}$").expect("valid regex")
    })
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn file_path_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^(\.{1,2}/|~/|/)?([A-Za-z0-9_.-]+/)*[A-Za-z0-9_.-]+/?$")
            .expect("valid regex")
    })
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn number_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?$")
            .expect("valid regex")
    })
}

/// `lowerCamelCase`: a lowercase letter followed by letters and digits.
pub(crate) fn is_camel_case(text: &str) -> bool {
    camel_case_regex().is_match(text)
}

/// Two to four camelCase segments joined by dots.
pub(crate) fn is_dotted_path(text: &str) -> bool {
    dotted_path_regex().is_match(text)
}

/// A relative or absolute file path containing at least one `/`.
pub(crate) fn is_file_path(text: &str) -> bool {
    text.contains('/') && file_path_regex().is_match(text)
}

pub(crate) fn is_url(text: &str) -> bool {
    text.contains("://") || text.starts_with("www.")
}

pub(crate) fn is_number(text: &str) -> bool {
    number_regex().is_match(text)
        || matches!(
            text,
            ".inf" | "-.inf" | "+.inf" | ".Inf" | "-.Inf" | ".nan" | ".NaN"
        )
}

/// Number of camelCase words in an identifier: `maxRetryCount` has three.
pub(crate) fn compound_word_count(segment: &str) -> usize {
    if segment.is_empty() {
        return 0;
    }
    let chars: Vec<char> = segment.chars().collect();
    let mut count = 1;
    for i in 1..chars.len() {
        let c = chars[i];
        if !c.is_ascii_uppercase() {
            continue;
        }
        let prev = chars[i - 1];
        let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
        if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_is_lower) {
            count += 1;
        }
    }
    count
}

/// Child path under a mapping key. The root path is empty.
pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Child path for a sequence position: `parent[index]`.
pub(crate) fn item_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Render a path for messages; the root is shown as `<root>`.
pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}
