//! Order-preserving document tree for the rule dialect.
//!
//! The tree is a closed set of node kinds ([`Node::Mapping`], [`Node::Sequence`],
//! [`Node::Scalar`], [`Node::Alias`]). Every traversal in the validators matches
//! on it exhaustively, so adding or removing a kind is a compile-checked change.
//!
//! Nodes carry their source position, their rendering style (quoting for
//! scalars, flow/block for collections) and any comment trivia attached to
//! entries, so a parsed document can be mutated in place and re-emitted with
//! unrelated formatting left alone.
//!
//! - [`parser`]: builds a [`Document`] from the `yaml-rust2` event stream
//! - [`emitter`]: block/flow serializer producing text from a [`Document`]

mod emitter;
mod parser;

pub use emitter::render_flow;
pub use parser::{ParseError, MAX_DEPTH};

use serde::Serialize;

/// 1-based source position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Trailing-newline handling of a block scalar (`|`, `|-`, `|+`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chomping {
    Clip,
    Strip,
    Keep,
}

/// How a scalar is written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal(Chomping),
    Folded(Chomping),
}

impl ScalarStyle {
    pub fn is_block(self) -> bool {
        matches!(self, ScalarStyle::Literal(_) | ScalarStyle::Folded(_))
    }

    pub fn describe(self) -> &'static str {
        match self {
            ScalarStyle::Plain => "unquoted",
            ScalarStyle::SingleQuoted => "single-quoted",
            ScalarStyle::DoubleQuoted => "double-quoted",
            ScalarStyle::Literal(_) => "literal block",
            ScalarStyle::Folded(_) => "folded block",
        }
    }
}

/// Inline (`{…}` / `[…]`) vs. indented multi-line rendering of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStyle {
    Block,
    Flow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: String,
    pub style: ScalarStyle,
    pub anchor: Option<String>,
    pub position: Position,
}

impl Scalar {
    pub fn new(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
            anchor: None,
            position: Position::default(),
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, ScalarStyle::Plain)
    }

    pub fn single_quoted(value: impl Into<String>) -> Self {
        Self::new(value, ScalarStyle::SingleQuoted)
    }

    pub fn double_quoted(value: impl Into<String>) -> Self {
        Self::new(value, ScalarStyle::DoubleQuoted)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Plain `~`, `null` or an absent value.
    pub fn is_null(&self) -> bool {
        self.style == ScalarStyle::Plain
            && matches!(self.value.as_str(), "" | "~" | "null" | "Null" | "NULL")
    }
}

/// A bare YAML alias (`*name`), as opposed to a quoted `'*path'` reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub position: Position,
}

/// Comment and blank lines attached to an entry.
///
/// `leading` holds whole lines emitted before the entry (an empty string is a
/// blank line); `trailing` is the `# comment` written after the value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trivia {
    pub leading: Vec<String>,
    pub trailing: Option<String>,
}

impl Trivia {
    pub fn is_empty(&self) -> bool {
        self.trailing.is_none() && self.leading.iter().all(|line| line.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Scalar,
    pub value: Node,
    pub trivia: Trivia,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: Node) -> Self {
        Self {
            key: Scalar::plain(key),
            value,
            trivia: Trivia::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub value: Node,
    pub trivia: Trivia,
}

impl Item {
    pub fn new(value: Node) -> Self {
        Self {
            value,
            trivia: Trivia::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub entries: Vec<Entry>,
    pub style: CollectionStyle,
    pub anchor: Option<String>,
    pub position: Position,
}

impl Default for Mapping {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            style: CollectionStyle::Block,
            anchor: None,
            position: Position::default(),
        }
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key.value == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|e| e.key.value == key)
            .map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries
            .iter_mut()
            .find(|e| e.key.value == key)
            .map(|e| &mut e.value)
    }

    pub fn push(&mut self, key: impl Into<String>, value: Node) {
        self.entries.push(Entry::new(key, value));
    }

    /// True if any entry carries a comment that a flow rendering would drop.
    pub fn has_comments(&self) -> bool {
        self.entries.iter().any(|e| !e.trivia.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub items: Vec<Item>,
    pub style: CollectionStyle,
    pub anchor: Option<String>,
    pub position: Position,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            style: CollectionStyle::Block,
            anchor: None,
            position: Position::default(),
        }
    }
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_comments(&self) -> bool {
        self.items.iter().any(|i| !i.trivia.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Sequence),
    Scalar(Scalar),
    Alias(Alias),
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(_) => "scalar",
            Node::Alias(_) => "alias",
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Node::Mapping(m) => m.position,
            Node::Sequence(s) => s.position,
            Node::Scalar(s) => s.position,
            Node::Alias(a) => a.position,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Sequence> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Walk `segments` through Mapping entries starting at this node.
    ///
    /// On failure returns the index of the first segment that could not be
    /// found.
    pub fn lookup(&self, segments: &[&str]) -> Result<&Node, usize> {
        let mut current = self;
        for (i, segment) in segments.iter().enumerate() {
            current = match current {
                Node::Mapping(m) => m.get(segment).ok_or(i)?,
                Node::Sequence(_) | Node::Scalar(_) | Node::Alias(_) => return Err(i),
            };
        }
        Ok(current)
    }
}

/// A parsed dialect payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Node,
    /// Lines up to and including an explicit `---` marker, kept verbatim.
    pub prologue: Vec<String>,
    /// Comment and blank lines after the last root entry.
    pub trailing: Vec<String>,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Self {
            root,
            prologue: Vec::new(),
            trailing: Vec::new(),
        }
    }

    /// Parse a dialect payload.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parser::parse(text)
    }

    /// Serialize the document back to YAML text.
    pub fn to_yaml_string(&self) -> String {
        emitter::emit(self)
    }

    pub fn root_mapping(&self) -> Option<&Mapping> {
        self.root.as_mapping()
    }

    pub fn root_mapping_mut(&mut self) -> Option<&mut Mapping> {
        self.root.as_mapping_mut()
    }
}

#[cfg(test)]
mod tests;
