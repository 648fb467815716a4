//! Payload parsing on top of the `yaml-rust2` event stream.
//!
//! yaml-rust2 does the scanning and parsing. This module folds its marked
//! events into a [`Document`] and recovers from the source text what events
//! don't carry: flow vs. block layout, block-scalar chomping, anchor names,
//! comments and the `---` document marker.
//!
//! Tags, complex keys and multiple documents are rejected with a positioned
//! error, as is nesting deeper than [`MAX_DEPTH`].

use super::{
    Alias, Chomping, CollectionStyle, Document, Entry, Item, Mapping, Node, Position, Scalar,
    ScalarStyle, Sequence,
};
use rustc_hash::FxHashSet;
use thiserror::Error;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, ScanError, Scanner, TScalarStyle, TokenType};

/// Deepest collection nesting accepted. Every validation pass walks the tree
/// recursively, so this bounds their stack use.
pub const MAX_DEPTH: usize = 128;

/// A payload that could not be turned into a tree.
///
/// The display form ends with `at line X column Y` so callers can locate the
/// offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line} column {column}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    fn at(message: impl Into<String>, mark: &Marker) -> Self {
        Self::new(message, mark.line(), mark.col() + 1)
    }
}

impl From<ScanError> for ParseError {
    fn from(err: ScanError) -> Self {
        Self::at(err.info(), err.marker())
    }
}

type PResult<T> = Result<T, ParseError>;

pub(super) fn parse(text: &str) -> PResult<Document> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let source = Source::new(text);
    source.check_indentation()?;

    let mut builder = TreeBuilder {
        source: &source,
        anchors: anchor_names(text),
        stack: Vec::new(),
        root: None,
        documents: 0,
        block_lines: FxHashSet::default(),
        error: None,
    };
    let outcome = Parser::new(text.chars()).load(&mut builder, true);
    // A builder error is raised first, so it wins over whatever the parser
    // made of the events that followed.
    if let Some(err) = builder.error.take() {
        return Err(err);
    }
    outcome?;

    // A bare `---` with nothing after it yields an empty scalar root.
    let mut root = match builder.root.take() {
        Some(Node::Scalar(s)) if s.style == ScalarStyle::Plain && s.value.is_empty() => {
            Node::Mapping(Mapping::new())
        }
        Some(node) => node,
        None => Node::Mapping(Mapping::new()),
    };
    let mut trivia = TriviaCollector {
        source: &source,
        taken: builder.block_lines,
        trailing_taken: FxHashSet::default(),
    };
    trivia.attach(&mut root);
    let prologue = source.prologue();
    let trailing = trivia.document_trailing(prologue.len());

    Ok(Document {
        root,
        prologue,
        trailing,
    })
}

/// Anchor names in the order yaml-rust2 numbers them (ids start at 1).
fn anchor_names(text: &str) -> Vec<String> {
    Scanner::new(text.chars())
        .filter_map(|token| match token.1 {
            TokenType::Anchor(name) => Some(name),
            _ => None,
        })
        .collect()
}

fn position(mark: &Marker) -> Position {
    Position::new(mark.line(), mark.col() + 1)
}

/// The payload split into lines, for questions events can't answer.
struct Source<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Source<'a> {
    fn new(text: &'a str) -> Self {
        let mut lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        // `split` yields one empty element after a final newline.
        if text.ends_with('\n') {
            lines.pop();
        }
        Self { lines }
    }

    /// Line `number` (1-based).
    fn line(&self, number: usize) -> Option<&'a str> {
        number.checked_sub(1).and_then(|i| self.lines.get(i).copied())
    }

    /// Text from the marker to the end of its line.
    fn rest(&self, mark: &Marker) -> &'a str {
        let Some(line) = self.line(mark.line()) else {
            return "";
        };
        match line.char_indices().nth(mark.col()) {
            Some((offset, _)) => &line[offset..],
            None => "",
        }
    }

    fn char_at(&self, mark: &Marker) -> Option<char> {
        self.rest(mark).chars().next()
    }

    fn check_indentation(&self) -> PResult<()> {
        for (i, line) in self.lines.iter().enumerate() {
            let content = line.trim_start_matches(' ');
            if content.starts_with('\t') && !content.trim().is_empty() {
                let column = line.len() - content.len() + 1;
                return Err(ParseError::new("tabs are not allowed for indentation", i + 1, column));
            }
        }
        Ok(())
    }

    /// Chomping indicator of the block scalar header at `mark` (`|-`, `>+`).
    fn chomping(&self, mark: &Marker) -> Chomping {
        let header = self.rest(mark).chars().skip(1).take_while(|c| !c.is_whitespace());
        let mut chomping = Chomping::Clip;
        for c in header {
            match c {
                '-' => chomping = Chomping::Strip,
                '+' => chomping = Chomping::Keep,
                _ => {}
            }
        }
        chomping
    }

    /// Lines holding the body of the block scalar whose header is on `header`.
    fn block_body(&self, header: usize, chomping: Chomping) -> std::ops::RangeInclusive<usize> {
        let parent_indent = self.line(header).map_or(0, indent_of);
        let mut body_indent = None;
        let mut last = header;
        let mut number = header + 1;
        while let Some(line) = self.line(number) {
            if line.trim().is_empty() {
                if chomping == Chomping::Keep {
                    last = number;
                }
                number += 1;
                continue;
            }
            let indent = indent_of(line);
            let required = *body_indent.get_or_insert(indent);
            if indent <= parent_indent || indent < required {
                break;
            }
            last = number;
            number += 1;
        }
        header + 1..=last
    }

    /// Lines before the content up to an explicit `---` marker, if any.
    fn prologue(&self) -> Vec<String> {
        for (i, line) in self.lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
                continue;
            }
            let marker_only = trimmed
                .strip_prefix("---")
                .is_some_and(|rest| rest.trim().is_empty() || rest.trim_start().starts_with('#'));
            if marker_only {
                return self.lines[..=i].iter().map(|l| l.to_string()).collect();
            }
            break;
        }
        Vec::new()
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_trivia_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Byte offset of a `# comment` on `line`, skipping quoted text.
fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev = ' ';
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some('\'') if c == '\'' => {
                if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some('"') if c == '\\' => {
                chars.next();
            }
            Some('"') if c == '"' => quote = None,
            Some(_) => {}
            None if c == '#' && prev.is_whitespace() => return Some(i),
            None if (c == '\'' || c == '"') && (prev.is_whitespace() || "[{,:-".contains(prev)) => {
                quote = Some(c)
            }
            None => {}
        }
        prev = c;
    }
    None
}

enum Frame {
    Mapping { mapping: Mapping, key: Option<Scalar> },
    Sequence(Sequence),
}

struct TreeBuilder<'s> {
    source: &'s Source<'s>,
    anchors: Vec<String>,
    stack: Vec<Frame>,
    root: Option<Node>,
    documents: usize,
    /// Lines inside block scalar bodies; never comments.
    block_lines: FxHashSet<usize>,
    error: Option<ParseError>,
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(event, mark) {
            self.error = Some(err);
        }
    }
}

impl TreeBuilder<'_> {
    fn handle(&mut self, event: Event, mark: Marker) -> PResult<()> {
        match event {
            Event::DocumentStart { .. } => {
                self.documents += 1;
                if self.documents > 1 {
                    return Err(ParseError::at("multiple documents are not supported", &mark));
                }
                Ok(())
            }
            Event::Scalar(value, style, anchor, tag) => {
                if tag.is_some() {
                    return Err(ParseError::at("tags are not supported", &mark));
                }
                let scalar = self.scalar(value, style, anchor, &mark);
                self.add(Node::Scalar(scalar))
            }
            Event::Alias(id) => {
                let name = self.anchor(id).unwrap_or_default();
                self.add(Node::Alias(Alias {
                    name,
                    position: position(&mark),
                }))
            }
            Event::SequenceStart(anchor, tag) => {
                self.open(tag.is_some(), &mark)?;
                let style = match self.source.char_at(&mark) {
                    Some('[') => CollectionStyle::Flow,
                    _ => CollectionStyle::Block,
                };
                let anchor = self.anchor(anchor);
                self.stack.push(Frame::Sequence(Sequence {
                    items: Vec::new(),
                    style,
                    anchor,
                    position: position(&mark),
                }));
                Ok(())
            }
            Event::MappingStart(anchor, tag) => {
                self.open(tag.is_some(), &mark)?;
                let style = match self.source.char_at(&mark) {
                    Some('{') => CollectionStyle::Flow,
                    _ => CollectionStyle::Block,
                };
                let anchor = self.anchor(anchor);
                self.stack.push(Frame::Mapping {
                    mapping: Mapping {
                        entries: Vec::new(),
                        style,
                        anchor,
                        position: position(&mark),
                    },
                    key: None,
                });
                Ok(())
            }
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Sequence(sequence)) => self.add(Node::Sequence(sequence)),
                Some(Frame::Mapping { mapping, .. }) => self.add(Node::Mapping(mapping)),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn open(&self, tagged: bool, mark: &Marker) -> PResult<()> {
        if tagged {
            return Err(ParseError::at("tags are not supported", mark));
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(ParseError::at(
                format!("nesting is deeper than {} levels", MAX_DEPTH),
                mark,
            ));
        }
        Ok(())
    }

    fn anchor(&self, id: usize) -> Option<String> {
        id.checked_sub(1).and_then(|i| self.anchors.get(i)).cloned()
    }

    fn scalar(&mut self, value: String, style: TScalarStyle, anchor: usize, mark: &Marker) -> Scalar {
        let style = match style {
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal => ScalarStyle::Literal(self.source.chomping(mark)),
            TScalarStyle::Folded => ScalarStyle::Folded(self.source.chomping(mark)),
            #[allow(unreachable_patterns)]
            _ => ScalarStyle::Plain,
        };
        if let ScalarStyle::Literal(chomping) | ScalarStyle::Folded(chomping) = style {
            self.block_lines.extend(self.source.block_body(mark.line(), chomping));
        }
        // An absent value arrives as `~` marked at the following token.
        let value = if style == ScalarStyle::Plain && value == "~" && self.source.char_at(mark) != Some('~') {
            String::new()
        } else {
            value
        };
        Scalar {
            value,
            style,
            anchor: self.anchor(anchor),
            position: position(mark),
        }
    }

    fn add(&mut self, node: Node) -> PResult<()> {
        match self.stack.last_mut() {
            None => {
                self.root = Some(node);
                Ok(())
            }
            Some(Frame::Sequence(sequence)) => {
                sequence.items.push(Item::new(node));
                Ok(())
            }
            Some(Frame::Mapping { mapping, key }) => match key.take() {
                Some(key) => {
                    mapping.entries.push(Entry {
                        key,
                        value: node,
                        trivia: Default::default(),
                    });
                    Ok(())
                }
                None => match node {
                    Node::Scalar(scalar) => {
                        *key = Some(scalar);
                        Ok(())
                    }
                    other => {
                        let at = other.position();
                        Err(ParseError::new(
                            format!("complex mapping keys are not supported ({})", other.kind_name()),
                            at.line,
                            at.column,
                        ))
                    }
                },
            },
        }
    }
}

/// Attaches comment and blank lines to block entries and items.
///
/// A header line is the line an entry's key (or an item's value) starts on.
/// Leading trivia is the run of comment/blank lines directly above it; the
/// trailing comment is a `# …` at the end of it. Deeper headers are visited
/// first so an inner entry sharing a line with its parent item claims it.
struct TriviaCollector<'s> {
    source: &'s Source<'s>,
    taken: FxHashSet<usize>,
    trailing_taken: FxHashSet<usize>,
}

impl TriviaCollector<'_> {
    fn attach(&mut self, node: &mut Node) {
        match node {
            Node::Mapping(m) => {
                for entry in &mut m.entries {
                    self.attach(&mut entry.value);
                }
                if m.style == CollectionStyle::Block {
                    for entry in &mut m.entries {
                        let header = entry.key.position.line;
                        entry.trivia.leading = self.leading(header);
                        entry.trivia.trailing = self.trailing(header);
                    }
                }
            }
            Node::Sequence(s) => {
                for item in &mut s.items {
                    self.attach(&mut item.value);
                }
                if s.style == CollectionStyle::Block {
                    for item in &mut s.items {
                        let header = item.value.position().line;
                        item.trivia.leading = self.leading(header);
                        item.trivia.trailing = self.trailing(header);
                    }
                }
            }
            Node::Scalar(_) | Node::Alias(_) => {}
        }
    }

    fn leading(&mut self, header: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut number = header;
        while number > 1 {
            number -= 1;
            if self.taken.contains(&number) {
                break;
            }
            match self.source.line(number) {
                Some(line) if is_trivia_line(line) => {
                    self.taken.insert(number);
                    lines.push(line.trim().to_string());
                }
                _ => break,
            }
        }
        // Content on the header line itself is never someone's trivia.
        self.taken.insert(header);
        lines.reverse();
        lines
    }

    fn trailing(&mut self, header: usize) -> Option<String> {
        if !self.trailing_taken.insert(header) {
            return None;
        }
        let line = self.source.line(header)?;
        let start = comment_start(line)?;
        Some(line[start..].trim_end().to_string())
    }

    /// Comment, blank and `...` lines after the last content line.
    fn document_trailing(&self, prologue_len: usize) -> Vec<String> {
        let lines = &self.source.lines;
        let mut start = lines.len();
        while start > prologue_len {
            let number = start;
            let line = lines[start - 1];
            let is_end_marker = line.trim() == "...";
            if self.taken.contains(&number) || !(is_trivia_line(line) || is_end_marker) {
                break;
            }
            start -= 1;
        }
        lines[start..].iter().map(|l| l.trim().to_string()).collect()
    }
}
