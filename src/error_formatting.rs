//! Readable messages for payload parse errors.
//!
//! A parse error is reported with the offending source lines and a marker
//! under the failing column, plus a hint for the common mistakes.

use crate::document::ParseError;

/// Format a parse error with context lines from `payload`.
///
/// `first_line` is the 1-based line of the payload inside the original file,
/// so the line numbers shown match what the author sees in their editor.
pub fn describe_parse_error(error: &ParseError, payload: &str, first_line: usize) -> String {
    let offset = first_line.saturating_sub(1);
    let mut message = format!(
        "{} at line {} column {}",
        error.message,
        error.line + offset,
        error.column
    );

    if let Some(context) = context_lines(payload, error.line, error.column, offset) {
        message.push('\n');
        message.push_str(&context);
    }
    if let Some(hint) = guidance(error, payload) {
        message.push('\n');
        message.push_str(&hint);
    }
    message
}

/// Two lines before the error, the error line, and a caret under the column.
fn context_lines(payload: &str, line: usize, column: usize, offset: usize) -> Option<String> {
    let lines: Vec<&str> = payload.lines().collect();
    if line == 0 || line > lines.len() {
        return None;
    }

    let mut context = String::new();
    let start = line.saturating_sub(3);
    for (i, text) in lines.iter().enumerate().take(line).skip(start) {
        let number = i + 1 + offset;
        context.push_str(&format!("   {:>4} | {}\n", number, text));
    }
    let spaces = " ".repeat(column.saturating_sub(1));
    context.push_str(&format!("        | {}^ here", spaces));
    Some(context)
}

fn guidance(error: &ParseError, payload: &str) -> Option<String> {
    let line = payload.lines().nth(error.line.saturating_sub(1)).unwrap_or("");
    let message = error.message.as_str();

    if message.contains("tab") {
        return Some("   Hint: indent with spaces; tabs are not allowed in YAML indentation".to_string());
    }
    if message.contains("mapping values are not allowed") {
        return Some(
            "   Hint: text containing ': ' must be quoted, e.g. key: \"a: b\"".to_string(),
        );
    }
    if message.contains("quoted scalar") {
        return Some("   Hint: close the quote, or use '' inside single quotes for a literal '".to_string());
    }
    if message.contains("unknown anchor") {
        return Some("   Hint: define the anchor (&name) before any *name alias that uses it".to_string());
    }
    if message.contains("nesting is deeper") {
        return Some("   Hint: flatten the structure or move deep parts into their own section".to_string());
    }
    if message.contains("indentation") && line.trim_start().starts_with("- ") {
        return Some("   Hint: sequence items must align with their siblings".to_string());
    }
    if message.contains("indentation") {
        return Some("   Hint: child keys must be indented consistently under their parent".to_string());
    }
    None
}
