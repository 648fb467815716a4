use super::report::{DiagnosticCode, Report};
use super::shared::{is_camel_case, item_path, is_number};
use crate::config::EngineConfig;
use crate::document::{Mapping, Node, ScalarStyle};

const CONTEXT: &str = "$meta.domains";

/// Validate `$meta.domains`: presence, element kinds, tag grammar, count and
/// prefix overlap. Exact duplicates are removed before count and overlap run.
pub(crate) fn check_domains(meta: &mut Mapping, report: &mut Report, config: &EngineConfig) {
    let sequence = match meta.get_mut("domains") {
        None => {
            report.error(DiagnosticCode::DomainsMissing, "$meta.domains is required", CONTEXT);
            return;
        }
        Some(Node::Sequence(s)) => s,
        Some(other) => {
            report.error(
                DiagnosticCode::DomainsNotSequence,
                format!("$meta.domains must be a sequence, found a {}", other.kind_name()),
                CONTEXT,
            );
            return;
        }
    };
    if sequence.is_empty() {
        report.error(
            DiagnosticCode::DomainsEmpty,
            "$meta.domains must list at least one domain",
            CONTEXT,
        );
        return;
    }

    let mut seen: Vec<String> = Vec::new();
    let mut removed: Vec<String> = Vec::new();
    sequence.items.retain(|item| match &item.value {
        Node::Scalar(s) => {
            if seen.contains(&s.value) {
                removed.push(s.value.clone());
                false
            } else {
                seen.push(s.value.clone());
                true
            }
        }
        _ => true,
    });
    if !removed.is_empty() {
        report.fix(format!("Removed duplicate domains: {}", removed.join(", ")));
    }

    let mut tags: Vec<&str> = Vec::new();
    for (i, item) in sequence.items.iter().enumerate() {
        let context = item_path(CONTEXT, i);
        let tag = match &item.value {
            Node::Scalar(s) if !is_non_string(&s.value, s.style) => s.value.as_str(),
            other => {
                report.error(
                    DiagnosticCode::DomainNotString,
                    format!("Domain at position {} must be a string, found {}", i, describe(other)),
                    &context,
                );
                continue;
            }
        };
        tags.push(tag);

        let segments: Vec<&str> = tag.split('.').collect();
        if segments.len() > config.max_domain_depth {
            report.error(
                DiagnosticCode::DomainDepth,
                format!(
                    "Domain '{}' has {} segments, maximum is {}",
                    tag,
                    segments.len(),
                    config.max_domain_depth
                ),
                &context,
            );
        } else if !segments.iter().all(|s| is_camel_case(s)) {
            report.error(
                DiagnosticCode::DomainFormat,
                format!("Domain '{}' must be dot-separated camelCase segments", tag),
                &context,
            );
        }
    }

    if sequence.len() > config.max_domains {
        report.error(
            DiagnosticCode::DomainCount,
            format!(
                "$meta.domains lists {} domains, maximum is {}",
                sequence.len(),
                config.max_domains
            ),
            CONTEXT,
        );
    }

    for (i, a) in tags.iter().enumerate() {
        for b in &tags[i + 1..] {
            if is_dotted_prefix(a, b) || is_dotted_prefix(b, a) {
                report.error(
                    DiagnosticCode::DomainOverlap,
                    format!("Domains '{}' and '{}' overlap", a, b),
                    CONTEXT,
                );
            }
        }
    }
}

fn is_dotted_prefix(prefix: &str, tag: &str) -> bool {
    tag.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('.'))
}

/// Plain numbers, booleans and nulls are scalars but not strings.
fn is_non_string(value: &str, style: ScalarStyle) -> bool {
    style == ScalarStyle::Plain
        && (value.is_empty()
            || is_number(value)
            || matches!(value, "~" | "null" | "true" | "false" | "True" | "False"))
}

fn describe(node: &Node) -> String {
    match node {
        Node::Scalar(s) if s.value.is_empty() => "an empty value".to_string(),
        Node::Scalar(s) => format!("'{}'", s.value),
        other => format!("a {}", other.kind_name()),
    }
}
