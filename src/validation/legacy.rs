//! Legacy YAML constructs: merge keys and bare aliases.

use super::report::{DiagnosticCode, Report};
use super::shared::{child_path, item_path};
use crate::config::AliasPolicy;
use crate::document::{Document, Node, Scalar, ScalarStyle};

pub const MERGE_KEY: &str = "<<";

fn is_merge_key(key: &Scalar) -> bool {
    key.style == ScalarStyle::Plain && key.value == MERGE_KEY
}

/// Report merge keys anywhere in the tree, and bare aliases when the policy
/// rejects them. Aliases used as merge-key values are covered by the merge
/// key error.
pub(crate) fn check_legacy_constructs(doc: &Document, report: &mut Report, policy: AliasPolicy) {
    visit(&doc.root, "", report, policy);
}

fn visit(node: &Node, path: &str, report: &mut Report, policy: AliasPolicy) {
    match node {
        Node::Mapping(m) => {
            for entry in &m.entries {
                let child = child_path(path, &entry.key.value);
                if is_merge_key(&entry.key) {
                    report.error(
                        DiagnosticCode::MergeKeyNotAllowed,
                        "Merge keys (<<) are not allowed; copy the properties or use a reference",
                        &child,
                    );
                    continue;
                }
                visit(&entry.value, &child, report, policy);
            }
        }
        Node::Sequence(s) => {
            for (i, item) in s.items.iter().enumerate() {
                visit(&item.value, &item_path(path, i), report, policy);
            }
        }
        Node::Alias(a) => {
            if policy == AliasPolicy::Reject {
                report.error(
                    DiagnosticCode::AliasNotAllowed,
                    format!(
                        "YAML alias *{} is not allowed; use a quoted reference '*{}' instead",
                        a.name, a.name
                    ),
                    path,
                );
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Rewrite every bare alias into a quoted `'*name'` reference.
///
/// The anchor name is taken as the reference path as-is; whether it names a
/// real property is checked on the next validation of the corrected text.
pub(crate) fn convert_aliases(mut doc: Document, report: &mut Report) -> Document {
    convert(&mut doc.root, "", report);
    doc
}

fn convert(node: &mut Node, path: &str, report: &mut Report) {
    match node {
        Node::Mapping(m) => {
            for entry in &mut m.entries {
                if is_merge_key(&entry.key) {
                    continue;
                }
                let child = child_path(path, &entry.key.value);
                convert(&mut entry.value, &child, report);
            }
        }
        Node::Sequence(s) => {
            for (i, item) in s.items.iter_mut().enumerate() {
                convert(&mut item.value, &item_path(path, i), report);
            }
        }
        Node::Alias(a) => {
            let reference = format!("*{}", a.name);
            let position = a.position;
            report.fix(format!(
                "Converted alias {} at {} to reference '{}'",
                reference, path, reference
            ));
            *node = Node::Scalar(Scalar::single_quoted(reference).at(position));
        }
        Node::Scalar(_) => {}
    }
}
