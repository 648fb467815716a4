//! Structural validation of the root and the `$meta` section.
//!
//! Missing or misplaced pieces are repaired with safe defaults; a root that is
//! not a mapping is terminal for every later pass.

use super::domains::check_domains;
use super::report::{DiagnosticCode, Report};
use super::shared::{child_path, display_path, is_camel_case, is_dotted_path, item_path};
use crate::config::EngineConfig;
use crate::document::{Document, Entry, Mapping, Node, Scalar, ScalarStyle, Sequence};
use rustc_hash::FxHashSet;

pub const META_KEY: &str = "$meta";
pub const REFS_KEY: &str = "$refs";

/// Required `$meta` fields, in the order they are synthesized.
pub const REQUIRED_META_FIELDS: &[&str] = &["name", "purpose", "version", "spec", "domains"];

fn default_field(field: &str) -> Node {
    match field {
        "name" => Node::Scalar(Scalar::single_quoted("untitledDocument")),
        "purpose" => Node::Scalar(Scalar::double_quoted("Describe the purpose of this document")),
        "version" => Node::Scalar(Scalar::plain("1.0")),
        "spec" => Node::Scalar(Scalar::single_quoted("unspecified")),
        _ => Node::Sequence(Sequence::new()),
    }
}

pub(crate) fn check_structure(mut doc: Document, report: &mut Report, config: &EngineConfig) -> Document {
    check_duplicate_keys(&doc.root, "", report);

    let Some(root) = doc.root_mapping_mut() else {
        report.error(
            DiagnosticCode::RootNotMapping,
            format!("Document root must be a mapping, found a {}", doc.root.kind_name()),
            "",
        );
        return doc;
    };

    match root.index_of(META_KEY) {
        None => {
            root.entries.insert(0, Entry::new(META_KEY, Node::Mapping(Mapping::new())));
            report.fix("Added missing $meta section");
        }
        Some(0) => {}
        Some(index) => {
            let entry = root.entries.remove(index);
            root.entries.insert(0, entry);
            report.fix("Moved $meta section to first position");
        }
    }

    let meta_node = &mut root.entries[0].value;
    if matches!(meta_node, Node::Scalar(s) if s.is_null()) {
        *meta_node = Node::Mapping(Mapping::new());
        report.fix("Replaced empty $meta section with a mapping");
    }
    let Node::Mapping(meta) = meta_node else {
        report.error(
            DiagnosticCode::MetaNotMapping,
            format!("$meta must be a mapping, found a {}", meta_node.kind_name()),
            META_KEY,
        );
        return doc;
    };

    for field in REQUIRED_META_FIELDS {
        if !meta.contains_key(field) {
            meta.push(*field, default_field(field));
            report.fix(format!("Added missing $meta.{} field", field));
        }
    }

    check_name(meta, report);
    check_goal(meta, report);
    check_text_field(meta, "purpose", DiagnosticCode::InvalidPurpose, report);
    check_text_field(meta, "spec", DiagnosticCode::InvalidSpec, report);
    check_version(meta, report);
    check_domains(meta, report, config);

    doc
}

fn check_name(meta: &Mapping, report: &mut Report) {
    let context = child_path(META_KEY, "name");
    match meta.get("name") {
        Some(Node::Scalar(s)) if is_camel_case(&s.value) => {}
        Some(Node::Scalar(s)) => report.error(
            DiagnosticCode::InvalidName,
            format!("$meta.name '{}' must be a camelCase identifier", s.value),
            &context,
        ),
        Some(other) => report.error(
            DiagnosticCode::InvalidName,
            format!("$meta.name must be a scalar, found a {}", other.kind_name()),
            &context,
        ),
        None => {}
    }
}

fn check_goal(meta: &Mapping, report: &mut Report) {
    let context = child_path(META_KEY, "goal");
    match meta.get("goal") {
        None => {}
        Some(Node::Scalar(s)) if is_camel_case(&s.value) || is_dotted_path(&s.value) => {}
        Some(Node::Scalar(s)) => report.error(
            DiagnosticCode::InvalidGoal,
            format!("$meta.goal '{}' must be a camelCase identifier or dotted path", s.value),
            &context,
        ),
        Some(other) => report.error(
            DiagnosticCode::InvalidGoal,
            format!("$meta.goal must be a scalar, found a {}", other.kind_name()),
            &context,
        ),
    }
}

fn check_text_field(meta: &Mapping, field: &str, code: DiagnosticCode, report: &mut Report) {
    let context = child_path(META_KEY, field);
    match meta.get(field) {
        Some(Node::Scalar(s)) if !s.is_null() && !s.value.trim().is_empty() => {}
        Some(Node::Scalar(_)) => report.error(
            code,
            format!("$meta.{} must not be empty", field),
            &context,
        ),
        Some(other) => report.error(
            code,
            format!("$meta.{} must be text, found a {}", field, other.kind_name()),
            &context,
        ),
        None => {}
    }
}

fn parse_version(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn check_version(meta: &mut Mapping, report: &mut Report) {
    let context = child_path(META_KEY, "version");
    match meta.get_mut("version") {
        Some(Node::Scalar(s)) => {
            if parse_version(&s.value).is_none() {
                report.error(
                    DiagnosticCode::InvalidVersion,
                    format!("$meta.version '{}' must be a non-negative number", s.value),
                    &context,
                );
            } else if s.style != ScalarStyle::Plain {
                s.value = s.value.trim().to_string();
                s.style = ScalarStyle::Plain;
                report.fix("Converted $meta.version to a number");
            }
        }
        Some(other) => report.error(
            DiagnosticCode::InvalidVersion,
            format!("$meta.version must be a number, found a {}", other.kind_name()),
            &context,
        ),
        None => {}
    }
}

/// Report every mapping that repeats a key.
fn check_duplicate_keys(node: &Node, path: &str, report: &mut Report) {
    match node {
        Node::Mapping(m) => {
            let mut seen = FxHashSet::default();
            for entry in &m.entries {
                let key = entry.key.value.as_str();
                if !seen.insert(key) {
                    report.error(
                        DiagnosticCode::DuplicateKey,
                        format!("Duplicate key '{}' in {}", key, display_path(path)),
                        &child_path(path, key),
                    );
                }
                check_duplicate_keys(&entry.value, &child_path(path, key), report);
            }
        }
        Node::Sequence(s) => {
            for (i, item) in s.items.iter().enumerate() {
                check_duplicate_keys(&item.value, &item_path(path, i), report);
            }
        }
        Node::Scalar(_) | Node::Alias(_) => {}
    }
}
