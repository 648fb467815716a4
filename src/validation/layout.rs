use super::report::Report;
use super::shared::{child_path, item_path};
use crate::document::{render_flow, CollectionStyle, Document, Node};

/// Choose flow or block style for every non-root container.
///
/// A non-empty container is written inline when its flow rendering fits in
/// `threshold` characters, and as an indented block otherwise. Containers
/// holding comments or block scalars anywhere below them stay in block form.
/// The root is always block.
pub(crate) fn normalize_layout(mut doc: Document, report: &mut Report, threshold: usize) -> Document {
    match &mut doc.root {
        Node::Mapping(m) => {
            for entry in &mut m.entries {
                let path = child_path("", &entry.key.value);
                visit(&mut entry.value, &path, threshold, report);
            }
        }
        Node::Sequence(s) => {
            for (i, item) in s.items.iter_mut().enumerate() {
                visit(&mut item.value, &item_path("", i), threshold, report);
            }
        }
        Node::Scalar(_) | Node::Alias(_) => {}
    }
    doc
}

fn visit(node: &mut Node, path: &str, threshold: usize, report: &mut Report) {
    apply_style(node, path, threshold, report);
    match node {
        Node::Mapping(m) => {
            for entry in &mut m.entries {
                let child = child_path(path, &entry.key.value);
                visit(&mut entry.value, &child, threshold, report);
            }
        }
        Node::Sequence(s) => {
            for (i, item) in s.items.iter_mut().enumerate() {
                visit(&mut item.value, &item_path(path, i), threshold, report);
            }
        }
        Node::Scalar(_) | Node::Alias(_) => {}
    }
}

fn apply_style(node: &mut Node, path: &str, threshold: usize, report: &mut Report) {
    let empty = match node {
        Node::Mapping(m) => m.is_empty(),
        Node::Sequence(s) => s.is_empty(),
        Node::Scalar(_) | Node::Alias(_) => return,
    };
    if empty {
        return;
    }

    let width = render_flow(node).chars().count();
    let wanted = if width <= threshold && !must_stay_block(node) {
        CollectionStyle::Flow
    } else {
        CollectionStyle::Block
    };
    let style = match node {
        Node::Mapping(m) => &mut m.style,
        Node::Sequence(s) => &mut s.style,
        Node::Scalar(_) | Node::Alias(_) => return,
    };
    if *style == wanted {
        return;
    }
    *style = wanted;
    match wanted {
        CollectionStyle::Flow => report.fix(format!(
            "Converted {} to inline style ({} chars, limit {})",
            path, width, threshold
        )),
        CollectionStyle::Block => report.fix(format!(
            "Converted {} to block style ({} chars, limit {})",
            path, width, threshold
        )),
    }
}

/// Comments and `|`/`>` scalars have no flow rendering.
fn must_stay_block(node: &Node) -> bool {
    match node {
        Node::Mapping(m) => m.has_comments() || m.entries.iter().any(|e| must_stay_block(&e.value)),
        Node::Sequence(s) => s.has_comments() || s.items.iter().any(|i| must_stay_block(&i.value)),
        Node::Scalar(s) => s.style.is_block(),
        Node::Alias(_) => false,
    }
}
