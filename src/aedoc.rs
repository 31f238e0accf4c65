//! Documentation-comment parsing.
//!
//! Declarations are documented with `/** ... */` comments carrying AEDoc
//! tags. This module tokenizes a comment against the recognized tag table
//! and produces a structured view: modifier tags, block tags with their
//! trailing text, and the summary section.
//!
//! The tag table is process-wide immutable state, initialized once on first
//! use.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

/// How a recognized tag behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Standalone marker, e.g. `@public` or `@sealed`.
    Modifier,
    /// Starts a section that owns the following text, e.g. `@remarks`.
    Block,
}

/// Modifier tags recognized by the extractor.
pub const MODIFIER_TAGS: &[&str] = &[
    "@public",
    "@beta",
    "@alpha",
    "@internal",
    "@sealed",
    "@virtual",
    "@override",
    "@eventProperty",
    "@readonly",
    "@packageDocumentation",
    "@preapproved",
    "@betaDocumentation",
];

/// Block tags recognized by the extractor.
pub const BLOCK_TAGS: &[&str] = &[
    "@remarks",
    "@param",
    "@returns",
    "@example",
    "@deprecated",
    "@privateRemarks",
    "@internalRemarks",
    "@defaultValue",
    "@link",
    "@inheritDoc",
];

/// The global tag-definition table. Built once, read-only afterwards.
static TAG_TABLE: Lazy<HashMap<&'static str, TagKind>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for tag in MODIFIER_TAGS {
        table.insert(*tag, TagKind::Modifier);
    }
    for tag in BLOCK_TAGS {
        table.insert(*tag, TagKind::Block);
    }
    table
});

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[A-Za-z][A-Za-z0-9]*").expect("tag pattern must compile"));

/// Force initialization of the tag table.
///
/// Call this once at pipeline start. Parsing initializes lazily anyway, so
/// this exists to front-load the work and to make the lifecycle explicit.
pub fn init() {
    Lazy::force(&TAG_TABLE);
    Lazy::force(&TAG_PATTERN);
}

/// Look up a tag in the recognized-tag table.
pub fn tag_kind(tag: &str) -> Option<TagKind> {
    TAG_TABLE.get(tag).copied()
}

/// A block tag and the text that follows it up to the next block tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTag {
    pub name: String,
    pub text: String,
}

/// Structured view of one documentation comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    /// The comment exactly as it appears in source.
    pub raw: String,
    /// Recognized modifier tags present anywhere in the comment.
    pub modifier_tags: BTreeSet<String>,
    /// Block tag sections in order of appearance.
    pub block_tags: Vec<BlockTag>,
    /// Text before the first block tag, with modifier tags removed.
    pub summary: String,
}

impl DocComment {
    pub fn has_modifier(&self, tag: &str) -> bool {
        self.modifier_tags.contains(tag)
    }

    /// Whether the comment carries non-empty summary text.
    pub fn has_summary(&self) -> bool {
        !self.summary.is_empty()
    }

    pub fn block_tag(&self, name: &str) -> Option<&BlockTag> {
        self.block_tags.iter().find(|b| b.name == name)
    }
}

/// Parse a `/** ... */` comment into its structured form.
///
/// Unrecognized tags are left in the surrounding text. Modifier tags are
/// removed from the text flow wherever they occur.
pub fn parse(raw: &str) -> DocComment {
    let mut doc = DocComment {
        raw: raw.to_string(),
        ..Default::default()
    };

    // Current section: None = summary, Some = an open block tag.
    let mut open_block: Option<BlockTag> = None;
    let mut summary_lines: Vec<String> = Vec::new();

    for line in comment_lines(raw) {
        let mut rest = line.as_str();
        let mut cleaned = String::new();

        loop {
            match TAG_PATTERN.find(rest) {
                None => {
                    cleaned.push_str(rest);
                    break;
                }
                Some(m) => {
                    let tag = m.as_str();
                    match tag_kind(tag) {
                        Some(TagKind::Modifier) => {
                            doc.modifier_tags.insert(tag.to_string());
                            cleaned.push_str(&rest[..m.start()]);
                            rest = &rest[m.end()..];
                        }
                        Some(TagKind::Block) => {
                            cleaned.push_str(&rest[..m.start()]);
                            flush_line(&mut open_block, &mut summary_lines, &cleaned);
                            cleaned = String::new();
                            if let Some(block) = open_block.take() {
                                doc.block_tags.push(block);
                            }
                            open_block = Some(BlockTag {
                                name: tag.to_string(),
                                text: String::new(),
                            });
                            rest = &rest[m.end()..];
                        }
                        None => {
                            // Unknown tag: keep it as plain text.
                            cleaned.push_str(&rest[..m.end()]);
                            rest = &rest[m.end()..];
                        }
                    }
                }
            }
        }

        flush_line(&mut open_block, &mut summary_lines, &cleaned);
    }

    if let Some(block) = open_block.take() {
        doc.block_tags.push(block);
    }
    for block in &mut doc.block_tags {
        block.text = block.text.trim().to_string();
    }
    doc.summary = summary_lines.join("\n").trim().to_string();
    doc
}

/// Append one line of cleaned text to the open block tag or the summary.
fn flush_line(
    open_block: &mut Option<BlockTag>,
    summary_lines: &mut Vec<String>,
    cleaned: &str,
) {
    let trimmed = cleaned.trim();
    match open_block {
        Some(block) => {
            if !trimmed.is_empty() {
                if !block.text.is_empty() {
                    block.text.push('\n');
                }
                block.text.push_str(trimmed);
            }
        }
        None => {
            if !trimmed.is_empty() {
                summary_lines.push(trimmed.to_string());
            }
        }
    }
}

/// Strip the comment fences and per-line `*` gutters.
fn comment_lines(raw: &str) -> Vec<String> {
    let body = raw
        .trim()
        .trim_start_matches("/**")
        .trim_end_matches("*/");

    body.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let without_gutter = trimmed.strip_prefix('*').unwrap_or(trimmed);
            without_gutter.strip_prefix(' ').unwrap_or(without_gutter).to_string()
        })
        .collect()
}
