//! Serializer for the document tree.
//!
//! Block containers are written with two-space indentation, flow containers
//! on a single line. Scalars keep their quoting style unless the value cannot
//! be written in that style (multi-line text in quotes that cannot hold it,
//! unsafe plain text), in which case they fall back to double quotes.

use super::{Chomping, CollectionStyle, Document, Mapping, Node, Scalar, ScalarStyle, Sequence, Trivia};

const INDENT: usize = 2;

pub(super) fn emit(document: &Document) -> String {
    let mut out = String::new();
    for line in &document.prologue {
        out.push_str(line);
        out.push('\n');
    }
    match &document.root {
        Node::Mapping(m) if m.style == CollectionStyle::Block && !m.is_empty() => {
            emit_mapping(m, 0, false, &mut out);
        }
        Node::Sequence(s) if s.style == CollectionStyle::Block && !s.is_empty() => {
            emit_sequence(s, 0, false, &mut out);
        }
        other => {
            out.push_str(&render_flow(other));
            out.push('\n');
        }
    }
    for line in &document.trailing {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Canonical single-line rendering of a node, as used for flow containers.
pub fn render_flow(node: &Node) -> String {
    let mut out = String::new();
    write_flow(node, &mut out);
    out
}

fn write_flow(node: &Node, out: &mut String) {
    match node {
        Node::Mapping(m) => {
            write_anchor(&m.anchor, out);
            out.push('{');
            for (i, entry) in m.entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render_key(&entry.key, true));
                out.push_str(": ");
                write_flow(&entry.value, out);
            }
            out.push('}');
        }
        Node::Sequence(s) => {
            write_anchor(&s.anchor, out);
            out.push('[');
            for (i, item) in s.items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_flow(&item.value, out);
            }
            out.push(']');
        }
        Node::Scalar(s) => {
            write_anchor(&s.anchor, out);
            out.push_str(&render_scalar(s, true));
        }
        Node::Alias(a) => {
            out.push('*');
            out.push_str(&a.name);
        }
    }
}

fn write_anchor(anchor: &Option<String>, out: &mut String) {
    if let Some(name) = anchor {
        out.push('&');
        out.push_str(name);
        out.push(' ');
    }
}

fn pad(indent: usize, out: &mut String) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn write_leading(trivia: &Trivia, indent: usize, out: &mut String) {
    for line in &trivia.leading {
        if !line.is_empty() {
            pad(indent, out);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn write_trailing(trivia: &Trivia, out: &mut String) {
    if let Some(comment) = &trivia.trailing {
        out.push(' ');
        out.push_str(comment);
    }
}

fn is_block_collection(node: &Node) -> bool {
    match node {
        Node::Mapping(m) => m.style == CollectionStyle::Block && !m.is_empty(),
        Node::Sequence(s) => s.style == CollectionStyle::Block && !s.is_empty(),
        Node::Scalar(_) | Node::Alias(_) => false,
    }
}

/// Emit a block mapping at `indent`. With `inline_first` the first key is
/// written without indentation (the caller already wrote `- `).
fn emit_mapping(mapping: &Mapping, indent: usize, inline_first: bool, out: &mut String) {
    for (i, entry) in mapping.entries.iter().enumerate() {
        let inline = inline_first && i == 0;
        if !inline {
            write_leading(&entry.trivia, indent, out);
            pad(indent, out);
        }
        out.push_str(&render_key(&entry.key, false));
        out.push(':');
        emit_value(&entry.value, &entry.trivia, indent, out);
    }
}

fn emit_sequence(sequence: &Sequence, indent: usize, inline_first: bool, out: &mut String) {
    for (i, item) in sequence.items.iter().enumerate() {
        let inline = inline_first && i == 0;
        if !inline {
            write_leading(&item.trivia, indent, out);
        }
        // Comments above the first key of an inline mapping move above the dash.
        if let Node::Mapping(m) = &item.value {
            if is_block_collection(&item.value) && m.anchor.is_none() {
                write_leading(&m.entries[0].trivia, indent, out);
            }
        }
        if !inline {
            pad(indent, out);
        }
        out.push('-');

        match &item.value {
            Node::Mapping(m) if is_block_collection(&item.value) && m.anchor.is_none() => {
                out.push(' ');
                emit_mapping(m, indent + INDENT, true, out);
            }
            Node::Sequence(s) if is_block_collection(&item.value) && s.anchor.is_none() => {
                out.push(' ');
                emit_sequence(s, indent + INDENT, true, out);
            }
            value => emit_value(value, &item.trivia, indent, out),
        }
    }
}

/// Emit everything after `key:` or `-`, including the line break.
fn emit_value(value: &Node, trivia: &Trivia, indent: usize, out: &mut String) {
    match value {
        Node::Mapping(m) if is_block_collection(value) => {
            if let Some(anchor) = &m.anchor {
                out.push_str(" &");
                out.push_str(anchor);
            }
            write_trailing(trivia, out);
            out.push('\n');
            emit_mapping(m, indent + INDENT, false, out);
        }
        Node::Sequence(s) if is_block_collection(value) => {
            if let Some(anchor) = &s.anchor {
                out.push_str(" &");
                out.push_str(anchor);
            }
            write_trailing(trivia, out);
            out.push('\n');
            emit_sequence(s, indent + INDENT, false, out);
        }
        // `key:` with nothing after it; only flow context spells out `null`.
        Node::Scalar(s) if s.style == ScalarStyle::Plain && s.value.is_empty() => {
            if let Some(anchor) = &s.anchor {
                out.push_str(" &");
                out.push_str(anchor);
            }
            write_trailing(trivia, out);
            out.push('\n');
        }
        Node::Scalar(s) if s.style.is_block() => {
            out.push(' ');
            write_anchor(&s.anchor, out);
            emit_block_scalar(s, trivia, indent + INDENT, out);
        }
        other => {
            let rendered = render_flow(other);
            if !rendered.is_empty() {
                out.push(' ');
                out.push_str(&rendered);
            }
            write_trailing(trivia, out);
            out.push('\n');
        }
    }
}

fn emit_block_scalar(scalar: &Scalar, trivia: &Trivia, indent: usize, out: &mut String) {
    let (indicator, chomping) = match scalar.style {
        ScalarStyle::Literal(c) => ('|', c),
        ScalarStyle::Folded(c) => ('>', c),
        // Callers only route block styles here.
        _ => ('|', Chomping::Clip),
    };
    out.push(indicator);
    match chomping {
        Chomping::Clip => {}
        Chomping::Strip => out.push('-'),
        Chomping::Keep => out.push('+'),
    }
    write_trailing(trivia, out);
    out.push('\n');

    let body = match chomping {
        Chomping::Strip => scalar.value.as_str(),
        Chomping::Clip | Chomping::Keep => scalar
            .value
            .strip_suffix('\n')
            .unwrap_or(scalar.value.as_str()),
    };
    if body.is_empty() && chomping != Chomping::Keep {
        return;
    }

    let lines: Vec<&str> = match scalar.style {
        ScalarStyle::Folded(_) => {
            // Each line break in the value becomes one blank line; every
            // paragraph is written on a single line so nothing re-folds.
            let mut lines = Vec::new();
            for (i, paragraph) in body.split('\n').enumerate() {
                if i > 0 {
                    lines.push("");
                }
                if !paragraph.is_empty() {
                    lines.push(paragraph);
                }
            }
            lines
        }
        _ => body.split('\n').collect(),
    };

    for line in lines {
        if !line.is_empty() {
            pad(indent, out);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn render_key(key: &Scalar, flow: bool) -> String {
    match key.style {
        ScalarStyle::Plain
            if plain_is_safe(&key.value, flow)
                && !key.value.is_empty()
                && !(flow && key.value.contains(':')) =>
        {
            key.value.clone()
        }
        ScalarStyle::SingleQuoted if !key.value.contains('\n') => single_quote(&key.value),
        _ => double_quote(&key.value),
    }
}

/// Inline rendering of a scalar value (no anchor).
fn render_scalar(scalar: &Scalar, flow: bool) -> String {
    match scalar.style {
        ScalarStyle::Plain if scalar.value.is_empty() && flow => "null".to_string(),
        ScalarStyle::Plain if plain_is_safe(&scalar.value, flow) => scalar.value.clone(),
        ScalarStyle::SingleQuoted if !scalar.value.contains('\n') => single_quote(&scalar.value),
        _ => double_quote(&scalar.value),
    }
}

/// Whether `value` reads back as the same plain scalar.
fn plain_is_safe(value: &str, flow: bool) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };
    if "'\"[]{}#&*!|>%@`,".contains(first) || value.starts_with("- ") || value == "-" {
        return false;
    }
    if value.contains('\n')
        || value.contains(": ")
        || value.ends_with(':')
        || value.contains(" #")
        || value.starts_with(' ')
        || value.ends_with(' ')
    {
        return false;
    }
    !(flow && value.chars().any(|c| ",[]{}".contains(c)))
}

fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
