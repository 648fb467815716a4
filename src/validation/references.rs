//! Reference discovery and resolution.
//!
//! References are `*`-prefixed dotted paths, either as a whole scalar value
//! (`'*section.key'`) or embedded in prose (`"see *section.key"`). Internal
//! references resolve against the document itself; `*$refs.key.path`
//! resolves inside the file declared under `$refs.key`.

use super::cycles::ReferenceGraph;
use super::legacy::{check_legacy_constructs, MERGE_KEY};
use super::report::{Diagnostic, DiagnosticCode, Report};
use super::shared::{child_path, display_path, item_path};
use super::structure::REFS_KEY;
use crate::cache::ExternalCache;
use crate::config::EngineConfig;
use crate::document::{Document, Mapping, Node};
use crate::extract::{extract, SourceKind};
use crate::loader::{absolute_path, DocumentLoader, LoadError};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Collaborators needed to resolve external references.
pub(crate) struct ResolveContext<'a> {
    pub config: &'a EngineConfig,
    pub source: Option<&'a Path>,
    pub loader: &'a dyn DocumentLoader,
    pub cache: &'a ExternalCache,
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn internal_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^\*([a-zA-Z][a-zA-Z0-9]*(?:\.[a-zA-Z][a-zA-Z0-9]*)*)$")
            .expect("valid regex")
    })
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn external_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(
            r"^\*\$refs\.([a-zA-Z][a-zA-Z0-9]*)\.([a-zA-Z][a-zA-Z0-9]*(?:\.[a-zA-Z][a-zA-Z0-9]*)*)$",
        )
        .expect("valid regex")
    })
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn prose_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(
            r"(?:^|[^\\\w*])(\*(?:\$refs\.)?[a-zA-Z][a-zA-Z0-9]*(?:\.[a-zA-Z][a-zA-Z0-9]*)*)",
        )
        .expect("valid regex")
    })
}

/// One reference occurrence: the property holding it and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferenceSite {
    pub holder: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedReference {
    Internal(Vec<String>),
    External { key: String, path: Vec<String> },
}

/// Parse a reference against the dialect grammar.
pub(crate) fn parse_reference(text: &str) -> Result<ParsedReference, &'static str> {
    if let Some(caps) = external_regex().captures(text) {
        return Ok(ParsedReference::External {
            key: caps[1].to_string(),
            path: caps[2].split('.').map(str::to_string).collect(),
        });
    }
    if text.contains("$refs") {
        return Err("external references must have the form *$refs.<key>.<path>");
    }
    if let Some(caps) = internal_regex().captures(text) {
        return Ok(ParsedReference::Internal(
            caps[1].split('.').map(str::to_string).collect(),
        ));
    }
    Err("expected *segment(.segment)* with alphanumeric segments")
}

/// Find every reference in the document, deduplicated by holder and text.
pub(crate) fn collect_references(doc: &Document) -> Vec<ReferenceSite> {
    let mut sites = Vec::new();
    collect(&doc.root, "", &mut sites);
    let mut seen = FxHashSet::default();
    sites.retain(|site: &ReferenceSite| seen.insert((site.holder.clone(), site.text.clone())));
    sites
}

/// Markdown emphasis: `*word*` or `*several words*`. The next `*` on the
/// same line closes the span when it directly follows a non-space character.
fn closes_emphasis(rest: &str) -> bool {
    let line = rest.split('\n').next().unwrap_or_default();
    match line.find('*') {
        Some(0) => true,
        Some(idx) => line[..idx].chars().next_back().is_some_and(|c| !c.is_whitespace()),
        None => false,
    }
}

fn collect(node: &Node, path: &str, sites: &mut Vec<ReferenceSite>) {
    match node {
        Node::Mapping(m) => {
            for entry in &m.entries {
                let key = entry.key.value.as_str();
                if key == MERGE_KEY || (path.is_empty() && key == REFS_KEY) {
                    continue;
                }
                collect(&entry.value, &child_path(path, key), sites);
            }
        }
        Node::Sequence(s) => {
            for (i, item) in s.items.iter().enumerate() {
                collect(&item.value, &item_path(path, i), sites);
            }
        }
        Node::Scalar(s) => {
            let text = s.value.trim();
            if text.starts_with('*') {
                sites.push(ReferenceSite {
                    holder: path.to_string(),
                    text: text.to_string(),
                });
                return;
            }
            for caps in prose_regex().captures_iter(&s.value) {
                let Some(m) = caps.get(1) else { continue };
                if closes_emphasis(&s.value[m.end()..]) {
                    continue;
                }
                sites.push(ReferenceSite {
                    holder: path.to_string(),
                    text: m.as_str().to_string(),
                });
            }
        }
        Node::Alias(_) => {}
    }
}

#[derive(Debug, Clone)]
enum ExternalFailure {
    Load(LoadError),
    Encoding,
    Parse(String),
}

/// Directory external paths are resolved against.
///
/// This is the referring file's directory, unless that directory is one of
/// the configured rules directories, in which case it is the project root
/// above it.
pub(crate) fn base_directory(source: Option<&Path>, rules_dirs: &[String]) -> PathBuf {
    let parent = source
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    for rules_dir in rules_dirs {
        let suffix = Path::new(rules_dir);
        if !suffix.as_os_str().is_empty() && parent.ends_with(suffix) {
            let depth = suffix.components().count();
            if let Some(root) = parent.ancestors().nth(depth) {
                let root = if root.as_os_str().is_empty() { Path::new(".") } else { root };
                return root.to_path_buf();
            }
        }
    }
    parent.to_path_buf()
}

fn declared_path(entry: &Node) -> Option<&str> {
    let scalar = match entry {
        Node::Scalar(s) => s,
        Node::Mapping(m) => m.get("path").and_then(Node::as_scalar)?,
        Node::Sequence(_) | Node::Alias(_) => return None,
    };
    let value = scalar.value.trim();
    (!scalar.is_null() && !value.is_empty()).then_some(value)
}

struct Resolver<'a, 'r> {
    ctx: &'r ResolveContext<'a>,
    doc: &'r Document,
    refs: Option<&'r Mapping>,
    base: PathBuf,
    loaded: FxHashMap<PathBuf, Result<Arc<Document>, ExternalFailure>>,
    used_keys: FxHashSet<String>,
    graph: ReferenceGraph,
}

impl<'a, 'r> Resolver<'a, 'r> {
    fn resolve(&mut self, site: &ReferenceSite, report: &mut Report) {
        match parse_reference(&site.text) {
            Err(problem) => report.error(
                DiagnosticCode::ReferenceFormat,
                format!("Malformed reference '{}': {}", site.text, problem),
                &site.holder,
            ),
            Ok(ParsedReference::Internal(segments)) => self.resolve_internal(site, &segments, report),
            Ok(ParsedReference::External { key, path }) => {
                self.used_keys.insert(key.clone());
                self.resolve_external(site, &key, &path, report);
            }
        }
    }

    fn resolve_internal(&mut self, site: &ReferenceSite, segments: &[String], report: &mut Report) {
        let parts: Vec<&str> = segments.iter().map(String::as_str).collect();
        match self.doc.root.lookup(&parts) {
            Ok(_) => self.graph.add_edge(&site.holder, &parts.join(".")),
            Err(failed) => report.error(
                DiagnosticCode::ReferenceUnresolved,
                format!(
                    "Reference '{}' does not resolve: no property '{}' under {}",
                    site.text,
                    parts[failed],
                    display_path(&parts[..failed].join("."))
                ),
                &site.holder,
            ),
        }
    }

    fn resolve_external(&mut self, site: &ReferenceSite, key: &str, path: &[String], report: &mut Report) {
        let Some(entry) = self.refs.and_then(|refs| refs.get(key)) else {
            report.error(
                DiagnosticCode::RefsKeyUnknown,
                format!("Reference '{}' names unknown $refs entry '{}'", site.text, key),
                &site.holder,
            );
            return;
        };
        let Some(declared) = declared_path(entry) else {
            report.error(
                DiagnosticCode::RefsPathMissing,
                format!("$refs.{} does not declare a file path", key),
                &site.holder,
            );
            return;
        };
        if !self.ctx.config.external_refs {
            tracing::trace!("Skipping external reference {}", site.text);
            return;
        }

        let file = absolute_path(&self.base.join(declared));
        let external = match self.load(&file) {
            Ok(document) => document,
            Err(failure) => {
                report.push(external_failure(&failure, &file, site));
                return;
            }
        };

        let parts: Vec<&str> = path.iter().map(String::as_str).collect();
        if let Err(failed) = external.root.lookup(&parts) {
            report.error(
                DiagnosticCode::ExternalReferenceUnresolved,
                format!(
                    "Reference '{}' does not resolve in {}: no property '{}' under {}",
                    site.text,
                    file.display(),
                    parts[failed],
                    display_path(&parts[..failed].join("."))
                ),
                &site.holder,
            );
        }
    }

    /// Load through the shared cache, remembering failures for this run only.
    fn load(&mut self, file: &Path) -> Result<Arc<Document>, ExternalFailure> {
        if let Some(outcome) = self.loaded.get(file) {
            return outcome.clone();
        }
        let loader = self.ctx.loader;
        let outcome = self.ctx.cache.get_or_try_load(file, || {
            tracing::debug!("Loading external document {}", file.display());
            let bytes = loader.load(file).map_err(ExternalFailure::Load)?;
            let text = String::from_utf8(bytes).map_err(|_| ExternalFailure::Encoding)?;
            let extraction = extract(&text, SourceKind::from_path(Some(file)))
                .map_err(|e| ExternalFailure::Parse(e.to_string()))?;
            Document::parse(extraction.payload()).map_err(|e| ExternalFailure::Parse(e.to_string()))
        });
        if let Err(failure) = &outcome {
            tracing::warn!("Failed to load external document {}: {:?}", file.display(), failure);
        }
        self.loaded.insert(file.to_path_buf(), outcome.clone());
        outcome
    }
}

fn external_failure(failure: &ExternalFailure, file: &Path, site: &ReferenceSite) -> Diagnostic {
    let (code, message) = match failure {
        ExternalFailure::Load(LoadError::NotFound(_)) => (
            DiagnosticCode::ExternalFileNotFound,
            format!("Referenced file not found: {}", file.display()),
        ),
        ExternalFailure::Load(LoadError::PermissionDenied(_)) => (
            DiagnosticCode::ExternalPermissionDenied,
            format!("Permission denied reading referenced file: {}", file.display()),
        ),
        ExternalFailure::Load(LoadError::IsDirectory(_)) => (
            DiagnosticCode::ExternalIsDirectory,
            format!("Referenced path is a directory: {}", file.display()),
        ),
        ExternalFailure::Load(LoadError::Io { message, .. }) => (
            DiagnosticCode::ExternalIoError,
            format!("Cannot read referenced file {}: {}", file.display(), message),
        ),
        ExternalFailure::Encoding => (
            DiagnosticCode::ExternalIoError,
            format!("Referenced file is not valid UTF-8: {}", file.display()),
        ),
        ExternalFailure::Parse(message) => (
            DiagnosticCode::ExternalParseError,
            format!("Referenced file {} does not parse: {}", file.display(), message),
        ),
    };
    Diagnostic::error(code, format!("{} (from '{}')", message, site.text)).with_context(site.holder.as_str())
}

/// Validate every reference in the document.
///
/// Runs the legacy-construct check first, then resolves internal and external
/// references, reports unused `$refs` entries and finally reports each
/// reference cycle once.
pub(crate) fn check_references(doc: Document, report: &mut Report, ctx: &ResolveContext<'_>) -> Document {
    check_legacy_constructs(&doc, report, ctx.config.alias_policy);

    let refs = match doc.root_mapping().and_then(|root| root.get(REFS_KEY)) {
        None => None,
        Some(Node::Mapping(m)) => Some(m),
        Some(other) => {
            report.error(
                DiagnosticCode::RefsNotMapping,
                format!("$refs must be a mapping, found a {}", other.kind_name()),
                REFS_KEY,
            );
            None
        }
    };

    let sites = collect_references(&doc);
    tracing::debug!("Found {} reference(s)", sites.len());

    let mut resolver = Resolver {
        ctx,
        doc: &doc,
        refs,
        base: base_directory(ctx.source, &ctx.config.rules_dirs),
        loaded: FxHashMap::default(),
        used_keys: FxHashSet::default(),
        graph: ReferenceGraph::default(),
    };
    for site in &sites {
        resolver.resolve(site, report);
    }

    if let Some(refs) = refs {
        for entry in &refs.entries {
            if !resolver.used_keys.contains(&entry.key.value) {
                report.warning(
                    DiagnosticCode::UnusedRefsEntry,
                    format!("$refs entry '{}' is not used by any reference", entry.key.value),
                    &child_path(REFS_KEY, &entry.key.value),
                );
            }
        }
    }

    for cycle in resolver.graph.find_cycles() {
        let mut diagnostic = Diagnostic::error(
            DiagnosticCode::CircularReference,
            format!("Circular reference: {}", cycle.join(" -> ")),
        )
        .with_context(cycle[0].as_str());
        diagnostic.cycle = Some(cycle);
        report.push(diagnostic);
    }

    doc
}
