//! Isolate the dialect payload inside a Markdown or YAML file.
//!
//! A rule file may start with a `---` frontmatter block, carry prose, and hold
//! its payload in one or more ```` ```yaml ```` fences. Everything outside the
//! payload is kept verbatim so corrected text can be reassembled around the
//! re-emitted payload.

use std::path::Path;
use thiserror::Error;

const FENCE: &str = "```";
const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.md` / `.mdc`: payload is expected inside yaml fences.
    Markdown,
    /// `.yaml` / `.yml`: the whole body is the payload.
    Yaml,
    /// Text without a path.
    Unknown,
}

impl SourceKind {
    pub fn from_path(path: Option<&Path>) -> Self {
        let ext = path
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("md") | Some("mdc") | Some("markdown") => SourceKind::Markdown,
            Some("yaml") | Some("yml") => SourceKind::Yaml,
            _ => SourceKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no YAML payload found: expected a ```yaml code block")]
    NoPayload,

    #[error("unclosed ```yaml code block starting at line {line}")]
    UnclosedFence { line: usize },
}

/// A payload plus the text surrounding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    prefix: String,
    payload: String,
    suffix: String,
    fenced: bool,
    /// The source had no fence and one will be added on reassembly.
    pub fence_added: bool,
    /// 1-based line of the first payload line in the original text.
    pub payload_line: usize,
}

impl Extraction {
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Rebuild the full file around a (possibly corrected) payload.
    ///
    /// Multiple source fences are merged into a single fence placed where the
    /// first one was; prose that sat between them follows the merged fence.
    pub fn reassemble(&self, payload: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + payload.len() + self.suffix.len() + 16);
        out.push_str(&self.prefix);
        if self.fenced {
            out.push_str(FENCE);
            out.push_str("yaml\n");
            out.push_str(payload);
            if !payload.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(FENCE);
            out.push('\n');
        } else {
            out.push_str(payload);
        }
        out.push_str(&self.suffix);
        out
    }
}

struct Fence {
    start: usize,
    end: usize,
    body: String,
}

/// Split `text` into frontmatter/prose and the dialect payload.
pub fn extract(text: &str, kind: SourceKind) -> Result<Extraction, ExtractError> {
    // A byte-order mark stays with the prefix so reassembly writes it back.
    let bom = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    // In a YAML file a leading `---` is a document marker, not frontmatter.
    let body_start = match kind {
        SourceKind::Yaml => bom,
        SourceKind::Markdown | SourceKind::Unknown => bom + frontmatter_end(&text[bom..]),
    };
    let body = &text[body_start..];
    let body_first_line = text[bom..body_start].lines().count() + 1;

    let fences = find_yaml_fences(body, body_first_line)?;
    if let (Some(first), Some(last)) = (fences.first(), fences.last()) {
        let payload = fences
            .iter()
            .map(|f| f.body.trim_end_matches('\n'))
            .collect::<Vec<_>>()
            .join("\n\n");
        let payload_line = body_first_line + body[..first.start].lines().count() + 1;
        let mut suffix: String = fences
            .windows(2)
            .map(|pair| &body[pair[0].end..pair[1].start])
            .collect();
        suffix.push_str(&body[last.end..]);
        tracing::trace!("Found {} yaml fence(s)", fences.len());
        return Ok(Extraction {
            prefix: text[..body_start + first.start].to_string(),
            payload: format!("{}\n", payload),
            suffix,
            fenced: true,
            fence_added: false,
            payload_line,
        });
    }

    match kind {
        SourceKind::Markdown => {
            if !looks_like_payload(body) {
                return Err(ExtractError::NoPayload);
            }
            Ok(Extraction {
                prefix: text[..body_start].to_string(),
                payload: body.to_string(),
                suffix: String::new(),
                fenced: true,
                fence_added: true,
                payload_line: body_first_line,
            })
        }
        SourceKind::Yaml | SourceKind::Unknown => Ok(Extraction {
            prefix: text[..body_start].to_string(),
            payload: body.to_string(),
            suffix: String::new(),
            fenced: false,
            fence_added: false,
            payload_line: body_first_line,
        }),
    }
}

/// Byte offset just past a leading `---` frontmatter block, or 0.
fn frontmatter_end(text: &str) -> usize {
    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return 0,
    }
    let mut offset = text.split_inclusive('\n').next().map_or(0, str::len);
    for line in lines {
        offset += line.len();
        if line.trim_end() == "---" {
            return offset;
        }
    }
    // Unterminated frontmatter is treated as body.
    0
}

fn fence_language(line: &str) -> Option<&str> {
    line.trim().strip_prefix(FENCE).map(str::trim)
}

fn find_yaml_fences(body: &str, first_line: usize) -> Result<Vec<Fence>, ExtractError> {
    let mut fences = Vec::new();
    let mut offset = 0;
    // (start offset, opening line, is_yaml, body)
    let mut open: Option<(usize, usize, bool, String)> = None;

    for (i, line) in body.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += line.len();
        match open.as_mut() {
            None => {
                if let Some(lang) = fence_language(line) {
                    let is_yaml = matches!(lang, "yaml" | "yml");
                    open = Some((line_start, first_line + i, is_yaml, String::new()));
                }
            }
            Some((start, _, is_yaml, content)) => {
                if line.trim() == FENCE {
                    if *is_yaml {
                        fences.push(Fence {
                            start: *start,
                            end: offset,
                            body: std::mem::take(content),
                        });
                    }
                    open = None;
                } else if *is_yaml {
                    content.push_str(line);
                    if !line.ends_with('\n') {
                        content.push('\n');
                    }
                }
            }
        }
    }

    match open {
        Some((_, line, true, _)) => Err(ExtractError::UnclosedFence { line }),
        _ => Ok(fences),
    }
}

/// The first significant line is a `key:` entry or a `- ` item.
fn looks_like_payload(body: &str) -> bool {
    let Some(line) = body
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
    else {
        return false;
    };
    if line.starts_with("- ") {
        return true;
    }
    match line.find(':') {
        Some(idx) => {
            let key = &line[..idx];
            let after = &line[idx + 1..];
            !key.is_empty()
                && !key.contains(char::is_whitespace)
                && (after.is_empty() || after.starts_with(' '))
        }
        None => false,
    }
}
