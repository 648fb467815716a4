//! End-to-end properties of the validation engine.

use rayon::prelude::*;
use rulemark::document::{CollectionStyle, Node};
use rulemark::{
    AliasPolicy, DiagnosticCode, Document, Engine, EngineConfig, ExternalCache, MemoryLoader,
    ValidationResult,
};
use std::path::Path;
use std::sync::Arc;

const META: &str = "$meta:\n  name: 'demoRules'\n  purpose: \"Demo rules\"\n  version: 1.0\n  spec: 'rulemark'\n  domains: ['core']\n";

fn engine() -> Engine {
    Engine::new(EngineConfig::default())
}

fn validate(text: &str) -> ValidationResult {
    engine().validate_text(text, None)
}

fn with_meta(body: &str) -> String {
    format!("{}{}", META, body)
}

fn codes(result: &ValidationResult) -> Vec<(DiagnosticCode, Option<String>)> {
    result
        .diagnostics
        .iter()
        .map(|d| (d.code, d.context.clone()))
        .collect()
}

/// Corrected output fed back in yields no further corrections and the same diagnostics.
#[test]
fn test_idempotence() {
    let input = "\
notes: 'Some words'
$meta:
  name: demoRules
  purpose: Demo purpose
  version: '1.0'
  spec: rulemark
  domains: ['core', 'core', 'style']
base: &base
  x: 1
link: *base
settings:
  isStrict: yes
  isOn: maybe
  mode: strict
  items:
    - alpha
    - beta
";
    let first = validate(input);
    assert!(!first.corrections.is_empty());
    let corrected = first.corrected_text.clone().unwrap();

    let second = validate(&corrected);
    assert!(second.corrections.is_empty(), "{:?}", second.corrections);
    assert!(second.corrected_text.is_none());
    assert_eq!(codes(&first), codes(&second));
    assert_eq!(first.count(DiagnosticCode::InvalidBoolean), 1);
}

#[test]
fn test_ledger_determinism() {
    let input = "section:\n  kind: camelCase\n  isOn: 'no'\n";
    let a = validate(input);
    let b = validate(input);
    assert_eq!(a.corrections, b.corrections);
    assert_eq!(a.corrected_text, b.corrected_text);
}

#[test]
fn test_declared_paths_resolve() {
    let result = validate(&with_meta(
        "section:\n  a:\n    b: 'x'\n  list: ['one']\nrefs:\n  direct: '*section.a.b'\n  parent: '*section.a'\n  prose: \"See *section.list and *section.a.b\"\n",
    ));
    assert!(result.valid, "{:?}", result.diagnostics);
    assert!(!result.has(DiagnosticCode::ReferenceUnresolved));
}

#[test]
fn test_cycle_symmetry() {
    let result = validate(&with_meta(
        "section1:\n  ref: '*section2.ref'\nsection2:\n  ref: '*section1.ref'\n",
    ));
    assert!(!result.valid);
    assert_eq!(result.count(DiagnosticCode::CircularReference), 1);
    let cycle = result
        .diagnostics
        .iter()
        .find_map(|d| d.cycle.clone())
        .unwrap();
    assert!(cycle.len() >= 2);
    assert_eq!(cycle.first(), cycle.last());
}

#[test]
fn test_boolean_coercion() {
    for (text, expected) in [
        ("true", true),
        ("yes", true),
        ("1", true),
        ("YES", true),
        ("false", false),
        ("no", false),
        ("0", false),
    ] {
        let result = validate(&with_meta(&format!("section:\n  hasX: '{}'\n", text)));
        assert!(result.valid, "{text}: {:?}", result.diagnostics);
        assert!(result.corrections.iter().any(|c| c.contains("section.hasX")), "{text}");
        let doc = Document::parse(result.corrected_text.as_deref().unwrap()).unwrap();
        let value = doc.root.lookup(&["section", "hasX"]).unwrap().as_scalar().unwrap();
        assert_eq!(value.value, expected.to_string(), "{text}");
    }

    let result = validate(&with_meta("section:\n  hasX: 'maybe'\n"));
    assert_eq!(result.count(DiagnosticCode::InvalidBoolean), 1);
    assert!(!result.corrections.iter().any(|c| c.contains("hasX")));
}

#[test]
fn test_domain_bounds() {
    let domains = |list: &str| META.replace("['core']", list);

    assert!(validate(&domains("['core', 'style', 'docs.api']")).valid);

    let result = validate(&domains("['core', 'style', 'docs', 'tests']"));
    assert_eq!(result.count(DiagnosticCode::DomainCount), 1);

    let result = validate(&domains("['a.b.c.d.e']"));
    assert_eq!(result.count(DiagnosticCode::DomainDepth), 1);

    let result = validate(&domains("['a.b', 'a.b.c']"));
    assert_eq!(result.count(DiagnosticCode::DomainOverlap), 1);
}

#[test]
fn test_layout_threshold() {
    // `{k: '…'}` is 7 characters plus the value.
    let fits = format!("section:\n  k: '{}'\n", "x".repeat(43));
    let result = validate(&with_meta(&fits));
    let doc = Document::parse(result.corrected_text.as_deref().unwrap()).unwrap();
    assert!(matches!(
        doc.root.lookup(&["section"]),
        Ok(Node::Mapping(m)) if m.style == CollectionStyle::Flow
    ));
    assert!(validate(&doc.to_yaml_string()).corrections.is_empty());

    let too_long = format!("section: {{k: '{}'}}\n", "x".repeat(44));
    let result = validate(&with_meta(&too_long));
    let doc = Document::parse(result.corrected_text.as_deref().unwrap()).unwrap();
    assert!(matches!(
        doc.root.lookup(&["section"]),
        Ok(Node::Mapping(m)) if m.style == CollectionStyle::Block
    ));
    assert!(validate(&doc.to_yaml_string()).corrections.is_empty());
}

#[test]
fn test_merge_keys_make_document_invalid() {
    let result = validate(&with_meta("base: &b\n  x: 1\nother:\n  <<: *b\n  y: 2\n"));
    assert!(!result.valid);
    assert_eq!(result.count(DiagnosticCode::MergeKeyNotAllowed), 1);
}

#[test]
fn test_alias_policies() {
    let text = with_meta("base: &base {x: 1}\nlink: *base\n");

    let converted = validate(&text);
    assert!(converted.valid, "{:?}", converted.diagnostics);
    assert!(converted.corrected_text.unwrap().contains("link: '*base'"));

    let config = EngineConfig {
        alias_policy: AliasPolicy::Reject,
        ..EngineConfig::default()
    };
    let rejected = Engine::new(config).validate_text(&text, None);
    assert!(!rejected.valid);
    assert_eq!(rejected.count(DiagnosticCode::AliasNotAllowed), 1);
    assert!(rejected.corrections.is_empty());
}

#[test]
fn test_end_to_end_missing_meta() {
    let result = validate("section1:\n  property: 'value'\n");
    assert!(!result.valid);
    assert!(result.has(DiagnosticCode::DomainsEmpty));
    for expected in [
        "Added missing $meta section",
        "Added missing $meta.name field",
        "Added missing $meta.purpose field",
        "Added missing $meta.version field",
        "Added missing $meta.spec field",
        "Added missing $meta.domains field",
    ] {
        assert!(result.corrections.iter().any(|c| c == expected), "{expected}");
    }
    let corrected = result.corrected_text.unwrap();
    assert!(corrected.starts_with("$meta:\n"));

    let value: serde_yaml::Value = serde_yaml::from_str(&corrected).unwrap();
    assert_eq!(value["section1"]["property"], serde_yaml::Value::from("value"));
    assert_eq!(value["$meta"]["version"], serde_yaml::Value::from(1.0));
}

#[test]
fn test_markdown_fence_is_added() {
    let text = "---\ndescription: demo\n---\nsection:\n  key: 'value'\n";
    let result = engine().validate_text(text, Some(Path::new("rules/demo.md")));
    assert_eq!(result.corrections[0], "Added missing yaml code fence");
    let corrected = result.corrected_text.unwrap();
    assert!(corrected.starts_with("---\ndescription: demo\n---\n```yaml\n$meta:\n"));
    assert!(corrected.ends_with("```\n"));
}

#[test]
fn test_prose_only_markdown() {
    let result = engine().validate_text("# Title\n\nNothing here.\n", Some(Path::new("a.md")));
    assert!(!result.valid);
    assert!(result.has(DiagnosticCode::NoPayload));
    assert!(result.corrected_text.is_none());
}

#[test]
fn test_parse_error_has_source_context() {
    let text = "intro\n\n```yaml\na:\n\tb: 2\n```\n";
    let result = engine().validate_text(text, Some(Path::new("a.md")));
    assert!(!result.valid);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.code, DiagnosticCode::ParseError);
    assert!(diagnostic.message.contains("tabs are not allowed for indentation at line 5 column 1"));
    assert!(diagnostic.message.contains("^ here"));
}

#[test]
fn test_unreadable_file_is_reported() {
    let result = engine().validate_path(Path::new("/definitely/not/here.md"));
    assert!(!result.valid);
    assert!(result.has(DiagnosticCode::FileNotFound));
}

#[test]
fn test_shared_cache_across_parallel_runs() {
    let loader = MemoryLoader::new().with_file(
        "/proj/shared.md",
        "```yaml\npatterns:\n  naming: 'camelCase'\n```\n",
    );
    let cache = Arc::new(ExternalCache::new());
    let engine = Engine::with_loader(EngineConfig::default(), Arc::new(loader), Arc::clone(&cache));
    let text = with_meta(
        "$refs:\n  shared:\n    path: './shared.md'\nstyle:\n  naming: '*$refs.shared.patterns.naming'\n",
    );

    let results: Vec<ValidationResult> = (0..16)
        .into_par_iter()
        .map(|i| engine.validate_text(&text, Some(Path::new(&format!("/proj/doc{}.md", i)))))
        .collect();

    for result in &results {
        assert!(result.valid, "{:?}", result.diagnostics);
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_prose_between_fences_survives_correction() {
    let text = format!(
        "# Rules\n```yaml\n{}```\nImportant prose between blocks.\n```yaml\ns:\n  k: v\n```\nClosing notes.\n",
        META
    );
    let result = engine().validate_text(&text, Some(Path::new("rules.md")));
    let corrected = result.corrected_text.unwrap();
    assert!(corrected.contains("Important prose between blocks."));
    assert!(corrected.contains("Closing notes."));
    assert_eq!(corrected.matches("```yaml").count(), 1);
}

#[test]
fn test_absent_values_stay_valid_yaml() {
    for body in ["s:\n  k:\n  j: 'x'\n", "s:\n  -\n  - 'a'\n"] {
        let result = validate(&with_meta(body));
        let corrected = result.corrected_text.unwrap();
        let parsed: Result<serde_yaml::Value, _> = serde_yaml::from_str(&corrected);
        assert!(parsed.is_ok(), "{corrected}");
    }
}

#[test]
fn test_nulls_keep_their_value() {
    let text = with_meta("s:\n  k: null\n  j: ~\n");
    let result = validate(&text);
    assert!(result.valid, "{:?}", result.diagnostics);
    let corrected = result.corrected_text.unwrap_or_else(|| text.clone());
    let before: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    let after: serde_yaml::Value = serde_yaml::from_str(&corrected).unwrap();
    assert_eq!(before["s"], after["s"]);
}

#[test]
fn test_deep_nesting_is_reported_not_fatal() {
    let depth = 500;
    let text = format!("s: {}{}\n", "[".repeat(depth), "]".repeat(depth));
    let result = validate(&text);
    assert!(!result.valid);
    assert!(result.has(DiagnosticCode::ParseError));
}

#[test]
fn test_byte_order_mark_and_document_marker() {
    let result = engine().validate_text(&format!("\u{feff}{}", META), Some(Path::new("a.yaml")));
    assert!(result.valid, "{:?}", result.diagnostics);
    assert!(result.corrections.is_empty(), "{:?}", result.corrections);

    let result = engine().validate_text(&format!("---\n{}...\n", META), Some(Path::new("a.yaml")));
    assert!(result.valid, "{:?}", result.diagnostics);
    assert!(result.corrections.is_empty(), "{:?}", result.corrections);
}

#[test]
fn test_invalid_meta_values_are_not_requoted() {
    let text = META
        .replace("version: 1.0", "version: '-1'")
        .replace("['core']", "['core', 'a.b.c.d.e']");
    let result = validate(&text);
    assert!(result.has(DiagnosticCode::InvalidVersion));
    assert!(result.has(DiagnosticCode::DomainDepth));
    assert!(
        !result.corrections.iter().any(|c| c.contains("$meta.version") || c.contains("$meta.domains[")),
        "{:?}",
        result.corrections
    );
}

#[test]
fn test_multi_word_emphasis_is_prose() {
    let result = validate(&with_meta("s:\n  d: \"this is *very important* text\"\n"));
    assert!(result.valid, "{:?}", result.diagnostics);
}
