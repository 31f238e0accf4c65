//! Host-parser binding: tree-sitter source files.
//!
//! This is the only module that talks to tree-sitter directly for parsing.
//! Everything above it addresses syntax through [`SourceFile`] lookups and
//! [`NodeKey`] handles, so parsed trees stay owned here for the lifetime of
//! the program.

use std::path::{Path, PathBuf};

use tree_sitter::{Language, Node, Parser, Tree};

use super::FacadeError;

/// Identifies one loaded source file within a [`crate::facade::Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

/// A stable handle to a syntax node.
///
/// tree-sitter nodes borrow their tree, so long-lived structures hold a
/// `NodeKey` instead and re-locate the node on demand. The (extent, kind)
/// pair is unique within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
    pub kind: &'static str,
}

impl NodeKey {
    pub fn of(file: FileId, node: Node) -> Self {
        Self {
            file,
            start: node.start_byte(),
            end: node.end_byte(),
            kind: node.kind(),
        }
    }

    pub fn matches(&self, node: Node) -> bool {
        node.start_byte() == self.start && node.end_byte() == self.end && node.kind() == self.kind
    }
}

/// A parsed source file: original text, parse tree, and path.
///
/// The tree and the text are kept together so node text extraction never
/// copies; downstream spans slice `text` directly.
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the entry point's directory, for messages.
    pub rel_path: String,
    pub text: String,
    pub tree: Tree,
    line_starts: Vec<usize>,
}

fn typescript_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

impl SourceFile {
    /// Parse TypeScript source text.
    ///
    /// Partial parse errors still yield a tree with ERROR nodes; only a
    /// complete parser failure is an error.
    pub fn parse(path: &Path, rel_path: String, text: String) -> Result<Self, FacadeError> {
        let mut parser = Parser::new();
        parser
            .set_language(&typescript_language())
            .map_err(|e| FacadeError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let tree = parser
            .parse(text.as_bytes(), None)
            .ok_or_else(|| FacadeError::Parse {
                path: path.to_path_buf(),
                reason: "parser returned no tree".to_string(),
            })?;

        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            rel_path,
            text,
            tree,
            line_starts,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.text.as_bytes()).unwrap_or("")
    }

    /// Re-locate the node a key was taken from.
    ///
    /// Panics if the key does not belong to this file's tree; keys are only
    /// ever minted from live nodes, so a miss is a program bug.
    pub fn node_at(&self, key: NodeKey) -> Node<'_> {
        // Probe with the last covered byte so the lookup lands inside the
        // target node regardless of how the range bound is interpreted.
        let probe_end = key.end.saturating_sub(1).max(key.start);
        let mut node = self
            .root()
            .descendant_for_byte_range(key.start, probe_end)
            .unwrap_or_else(|| panic!("program bug: no node for key {:?}", key));
        loop {
            if key.matches(node) {
                return node;
            }
            match node.parent() {
                Some(parent) if parent.start_byte() <= key.start && parent.end_byte() >= key.end => {
                    node = parent;
                }
                _ => panic!("program bug: node key {:?} does not resolve", key),
            }
        }
    }

    /// 1-indexed (line, column) for a byte offset.
    pub fn line_col(&self, byte: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, byte - self.line_starts[line] + 1)
    }

    /// The whitespace indentation of the line containing `byte`.
    pub fn line_indent(&self, byte: usize) -> &str {
        let (line, _) = self.line_col(byte);
        let start = self.line_starts[line - 1];
        let rest = &self.text[start..];
        let len = rest.len() - rest.trim_start_matches(|c| c == ' ' || c == '\t').len();
        &rest[..len]
    }

    /// The `/** ... */` comment immediately preceding a declaration, if any.
    ///
    /// Declarations wrapped in `export` or `declare`, and declarators inside
    /// a declaration list, are documented on the wrapping statement.
    pub fn doc_comment_before(&self, key: NodeKey) -> Option<String> {
        let mut node = self.node_at(key);
        while let Some(parent) = node.parent() {
            let hoist = matches!(parent.kind(), "export_statement" | "ambient_declaration")
                || (node.kind() == "variable_declarator"
                    && matches!(parent.kind(), "lexical_declaration" | "variable_declaration"));
            if hoist {
                node = parent;
            } else {
                break;
            }
        }

        let mut prev = node.prev_sibling();
        while let Some(p) = prev {
            match p.kind() {
                "," | ";" => prev = p.prev_sibling(),
                "comment" => {
                    let text = self.node_text(p);
                    if text.starts_with("/**") {
                        return Some(text.to_string());
                    }
                    return None;
                }
                _ => return None,
            }
        }
        None
    }
}
