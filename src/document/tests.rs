use super::*;

fn parse(text: &str) -> Document {
    Document::parse(text).expect("payload should parse")
}

fn root(doc: &Document) -> &Mapping {
    doc.root_mapping().expect("root should be a mapping")
}

#[test]
fn test_parse_nested_block_mapping() {
    let doc = parse("$meta:\n  name: 'demo'\n  version: 1.0\nsection:\n  child:\n    leaf: x\n");
    let meta = root(&doc).get("$meta").and_then(Node::as_mapping).unwrap();
    assert_eq!(meta.len(), 2);
    let name = meta.get("name").and_then(Node::as_scalar).unwrap();
    assert_eq!(name.value, "demo");
    assert_eq!(name.style, ScalarStyle::SingleQuoted);
    let version = meta.get("version").and_then(Node::as_scalar).unwrap();
    assert_eq!(version.style, ScalarStyle::Plain);

    let leaf = doc.root.lookup(&["section", "child", "leaf"]).unwrap();
    assert_eq!(leaf.as_scalar().unwrap().value, "x");
}

#[test]
fn test_lookup_reports_failing_segment() {
    let doc = parse("a:\n  b: 1\n");
    assert_eq!(doc.root.lookup(&["a", "c"]).unwrap_err(), 1);
    assert_eq!(doc.root.lookup(&["a", "b", "c"]).unwrap_err(), 2);
    assert_eq!(doc.root.lookup(&["z"]).unwrap_err(), 0);
}

#[test]
fn test_parse_sequences_indented_and_compact() {
    let doc = parse("one:\n  - a\n  - b\ntwo:\n- c\n- d\nthree: x\n");
    let one = root(&doc).get("one").and_then(Node::as_sequence).unwrap();
    let two = root(&doc).get("two").and_then(Node::as_sequence).unwrap();
    assert_eq!(one.len(), 2);
    assert_eq!(two.len(), 2);
    assert!(root(&doc).contains_key("three"));
}

#[test]
fn test_parse_sequence_of_mappings() {
    let doc = parse("items:\n  - name: a\n    kind: x\n  - name: b\n");
    let items = root(&doc).get("items").and_then(Node::as_sequence).unwrap();
    assert_eq!(items.len(), 2);
    let first = items.items[0].value.as_mapping().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first.get("kind").and_then(Node::as_scalar).unwrap().value, "x");
}

#[test]
fn test_parse_flow_collections() {
    let doc = parse("tags: ['a', \"b\", c]\nmeta: {x: 1, y: 'two'}\nempty: {}\nnone: []\n");
    let tags = root(&doc).get("tags").and_then(Node::as_sequence).unwrap();
    assert_eq!(tags.style, CollectionStyle::Flow);
    assert_eq!(tags.len(), 3);
    assert_eq!(
        tags.items[1].value.as_scalar().unwrap().style,
        ScalarStyle::DoubleQuoted
    );
    let meta = root(&doc).get("meta").and_then(Node::as_mapping).unwrap();
    assert_eq!(meta.style, CollectionStyle::Flow);
    assert_eq!(meta.get("y").and_then(Node::as_scalar).unwrap().value, "two");
    assert!(root(&doc).get("empty").and_then(Node::as_mapping).unwrap().is_empty());
    assert!(root(&doc).get("none").and_then(Node::as_sequence).unwrap().is_empty());
}

#[test]
fn test_parse_multiline_flow_sequence() {
    let doc = parse("tags: [\n  'a',\n  'b'\n]\nnext: 1\n");
    let tags = root(&doc).get("tags").and_then(Node::as_sequence).unwrap();
    assert_eq!(tags.len(), 2);
    assert!(root(&doc).contains_key("next"));
}

#[test]
fn test_parse_quoted_escapes() {
    let doc = parse("a: 'it''s'\nb: \"line\\nbreak \\\"q\\\"\"\n");
    assert_eq!(root(&doc).get("a").and_then(Node::as_scalar).unwrap().value, "it's");
    assert_eq!(
        root(&doc).get("b").and_then(Node::as_scalar).unwrap().value,
        "line\nbreak \"q\""
    );
}

#[test]
fn test_parse_block_scalars() {
    let doc = parse("lit: |\n  first\n    indented\n  last\nfold: >-\n  one\n  two\n\n  three\nafter: x\n");
    let lit = root(&doc).get("lit").and_then(Node::as_scalar).unwrap();
    assert_eq!(lit.value, "first\n  indented\nlast\n");
    assert_eq!(lit.style, ScalarStyle::Literal(Chomping::Clip));
    let fold = root(&doc).get("fold").and_then(Node::as_scalar).unwrap();
    assert_eq!(fold.value, "one two\nthree");
    assert_eq!(fold.style, ScalarStyle::Folded(Chomping::Strip));
    assert!(root(&doc).contains_key("after"));
}

#[test]
fn test_parse_aliases_anchors_and_merge_keys() {
    let doc = parse("base: &base\n  x: 1\nother:\n  <<: *base\n  ref: *base\n  quoted: '*base.x'\n");
    let base = root(&doc).get("base").and_then(Node::as_mapping).unwrap();
    assert_eq!(base.anchor.as_deref(), Some("base"));
    let other = root(&doc).get("other").and_then(Node::as_mapping).unwrap();
    assert!(matches!(other.get("<<"), Some(Node::Alias(a)) if a.name == "base"));
    assert!(matches!(other.get("ref"), Some(Node::Alias(_))));
    assert!(matches!(other.get("quoted"), Some(Node::Scalar(s)) if s.value == "*base.x"));
}

#[test]
fn test_parse_comments_attach_to_entries() {
    let doc = parse("# heading\na: 1 # trailing\n\n# about b\nb: 2\n# end\n");
    let m = root(&doc);
    assert_eq!(m.entries[0].trivia.leading, vec!["# heading".to_string()]);
    assert_eq!(m.entries[0].trivia.trailing.as_deref(), Some("# trailing"));
    assert_eq!(
        m.entries[1].trivia.leading,
        vec![String::new(), "# about b".to_string()]
    );
    assert_eq!(doc.trailing, vec!["# end".to_string()]);
}

#[test]
fn test_parse_errors_carry_position() {
    let err = Document::parse("a: 1\nb: c: d\n").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(err.to_string().contains("at line 2 column"));

    let err = Document::parse("a: 'open\n").unwrap_err();
    assert!(err.message.contains("quoted scalar"));

    let err = Document::parse("a: *missing\n").unwrap_err();
    assert!(err.message.contains("unknown anchor"));

    let err = Document::parse("a: 1\n---\nb: 2\n").unwrap_err();
    assert!(err.message.contains("multiple documents"));
    assert_eq!(err.line, 2);

    let err = Document::parse("a: !tag x\n").unwrap_err();
    assert!(err.message.contains("tags"));
}

#[test]
fn test_plain_value_with_colon_is_rejected() {
    assert!(Document::parse("a: b: c\n").is_err());
    assert!(Document::parse("url: https://example.com/a\n").is_ok());
}

#[test]
fn test_emit_round_trips_source() {
    let text = "\
# Rules
$meta:
  name: 'demo'
  purpose: \"Demo document\"
  version: 1.0
  domains: ['core.rules']
anchor: &anchor 'x'

section:
  list:
    - 'a'
    - key: 'v'
      other: 'w'
  text: |
    line one
    line two
  alias: *anchor # legacy
";
    let doc = parse(text);
    assert_eq!(doc.to_yaml_string(), text);
}

#[test]
fn test_emit_is_stable_after_mutation() {
    let mut doc = parse("a:\n  b: 'x'\n");
    let a = doc.root_mapping_mut().unwrap().get_mut("a").unwrap();
    a.as_mapping_mut().unwrap().style = CollectionStyle::Flow;
    let first = doc.to_yaml_string();
    assert_eq!(first, "a: {b: 'x'}\n");
    assert_eq!(parse(&first).to_yaml_string(), first);
}

#[test]
fn test_emit_block_from_flow() {
    let mut doc = parse("a: {b: 'x', c: [1, 2]}\n");
    let a = doc.root_mapping_mut().unwrap().get_mut("a").unwrap();
    a.as_mapping_mut().unwrap().style = CollectionStyle::Block;
    assert_eq!(doc.to_yaml_string(), "a:\n  b: 'x'\n  c: [1, 2]\n");
}

#[test]
fn test_emit_escapes_unsafe_scalars() {
    let mut m = Mapping::new();
    m.push("multi", Node::Scalar(Scalar::single_quoted("one\ntwo")));
    m.push("colon", Node::Scalar(Scalar::plain("a: b")));
    m.push("quote", Node::Scalar(Scalar::single_quoted("it's")));
    let text = Document::new(Node::Mapping(m)).to_yaml_string();
    assert_eq!(text, "multi: \"one\\ntwo\"\ncolon: \"a: b\"\nquote: 'it''s'\n");

    let reparsed = parse(&text);
    let value = reparsed.root.lookup(&["multi"]).unwrap().as_scalar().unwrap();
    assert_eq!(value.value, "one\ntwo");
}

#[test]
fn test_render_flow() {
    let doc = parse("a:\n  b: 'x'\n  c:\n    - 1\n    - \"two\"\n");
    let a = doc.root.lookup(&["a"]).unwrap();
    assert_eq!(render_flow(a), "{b: 'x', c: [1, \"two\"]}");
}

#[test]
fn test_emitted_yaml_is_accepted_by_serde_yaml() {
    let text = "a:\n  b: 'x'\n  c: [1, 2]\nd: |\n  text\n";
    let doc = parse(text);
    let value: serde_yaml::Value = serde_yaml::from_str(&doc.to_yaml_string()).unwrap();
    assert_eq!(value["a"]["b"], serde_yaml::Value::from("x"));
    assert_eq!(value["d"], serde_yaml::Value::from("text\n"));
}

#[test]
fn test_empty_payload_is_empty_mapping() {
    let doc = parse("\n# only a comment\n");
    assert!(root(&doc).is_empty());
}

#[test]
fn test_deep_nesting_is_a_parse_error() {
    let depth = MAX_DEPTH * 2;
    let text = format!("a: {}{}\n", "[".repeat(depth), "]".repeat(depth));
    let err = Document::parse(&text).unwrap_err();
    assert!(err.message.contains("nesting"), "{}", err.message);

    let fits = format!("a: {}{}\n", "[".repeat(MAX_DEPTH - 1), "]".repeat(MAX_DEPTH - 1));
    assert!(Document::parse(&fits).is_ok());
}

#[test]
fn test_absent_values_survive_flow_rendering() {
    let mut doc = parse("s:\n  k:\n  j: 'x'\nt:\n  -\n  - 'a'\n");
    let s = root(&doc).get("s").and_then(Node::as_mapping).unwrap();
    assert_eq!(s.get("k").and_then(Node::as_scalar).unwrap().value, "");
    assert_eq!(doc.to_yaml_string(), "s:\n  k:\n  j: 'x'\nt:\n  -\n  - 'a'\n");

    let m = doc.root_mapping_mut().unwrap();
    m.get_mut("s").unwrap().as_mapping_mut().unwrap().style = CollectionStyle::Flow;
    m.get_mut("t").unwrap().as_sequence_mut().unwrap().style = CollectionStyle::Flow;
    let text = doc.to_yaml_string();
    assert_eq!(text, "s: {k: null, j: 'x'}\nt: [null, 'a']\n");

    let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(value["s"]["k"], serde_yaml::Value::Null);
    assert_eq!(value["s"]["j"], serde_yaml::Value::from("x"));
    assert_eq!(value["t"][0], serde_yaml::Value::Null);
    assert_eq!(value["t"][1], serde_yaml::Value::from("a"));
}

#[test]
fn test_document_markers_and_bom() {
    let text = "# header\n---\na: 1\n...\n";
    let doc = parse(text);
    assert_eq!(doc.prologue, vec!["# header".to_string(), "---".to_string()]);
    assert_eq!(doc.trailing, vec!["...".to_string()]);
    assert_eq!(doc.to_yaml_string(), text);

    let doc = parse("\u{feff}a: 1\n");
    assert_eq!(root(&doc).get("a").and_then(Node::as_scalar).unwrap().value, "1");

    assert!(root(&parse("---\n")).is_empty());
}

#[test]
fn test_comment_marker_inside_quotes_is_text() {
    let doc = parse("a: 'x # y' # real\nb: \"p #q\"\n");
    let m = root(&doc);
    assert_eq!(m.get("a").and_then(Node::as_scalar).unwrap().value, "x # y");
    assert_eq!(m.entries[0].trivia.trailing.as_deref(), Some("# real"));
    assert_eq!(m.entries[1].trivia.trailing, None);
}
