//! Whitespace-preserving span tree over source text.
//!
//! A [`Span`] wraps one syntax node and divides its extent into four
//! virtual segments, emitted in order: prefix, children, suffix, separator.
//! Construction guarantees that concatenating the segments reproduces the
//! original source bit-exactly; spans reference the file text by offset and
//! never copy until emission.
//!
//! Inter-sibling gaps (whitespace, member delimiters) become separators,
//! pushed down into the deepest preceding span that has no non-empty
//! suffix. This is what lets child sorting re-stitch indentation: the
//! trailing separator travels with the member it follows.
//!
//! Bodies of classes, interfaces, enums, and namespaces group their members
//! under a synthetic `member_list` span so the member sequence can be
//! sorted as a unit without disturbing the braces.

use tree_sitter::Node;

use crate::facade::SourceFile;

/// Kind name for the synthetic member-grouping span.
pub const MEMBER_LIST: &str = "member_list";

/// Declarative rewrites applied to one span before emission.
#[derive(Debug, Clone, Default)]
pub struct SpanModification {
    /// Replaces the prefix text.
    pub prefix: Option<String>,
    /// Replaces the suffix text.
    pub suffix: Option<String>,
    pub omit_children: bool,
    pub omit_separator: bool,
    /// Sort children by `sort_key` during emission.
    pub sort_children: bool,
    /// Key for the parent's sort; children without one keep their order and
    /// are emitted last.
    pub sort_key: Option<String>,
}

/// One node of the span tree.
pub struct Span<'a> {
    source: &'a str,
    pub kind: &'static str,
    pub start: usize,
    pub end: usize,
    sep_start: usize,
    sep_end: usize,
    pub children: Vec<Span<'a>>,
    pub modification: SpanModification,
}

/// Body kinds whose interior members are grouped for sorting.
fn groups_members(node: Node) -> bool {
    match node.kind() {
        "class_body" | "interface_body" | "object_type" | "enum_body" => true,
        "statement_block" => node
            .parent()
            .map(|p| matches!(p.kind(), "internal_module" | "module"))
            .unwrap_or(false),
        _ => false,
    }
}

impl<'a> Span<'a> {
    /// Build the span tree for a node.
    pub fn build(file: &'a SourceFile, node: Node) -> Span<'a> {
        Self::from_node(&file.text, node)
    }

    fn from_node(source: &'a str, node: Node) -> Span<'a> {
        let mut span = Span {
            source,
            kind: node.kind(),
            start: node.start_byte(),
            end: node.end_byte(),
            sep_start: node.end_byte(),
            sep_end: node.end_byte(),
            children: Vec::new(),
            modification: SpanModification::default(),
        };

        let mut child_nodes: Vec<Node> = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            child_nodes.push(child);
        }

        if groups_members(node) {
            let open = child_nodes.iter().position(|n| n.kind() == "{");
            let close = child_nodes.iter().rposition(|n| n.kind() == "}");
            if let (Some(open), Some(close)) = (open, close) {
                if close > open {
                    for n in &child_nodes[..=open] {
                        span.children.push(Self::from_node(source, *n));
                    }
                    // Member delimiters fold into the separators between
                    // members, so sorting carries them along.
                    let members: Vec<Node> = child_nodes[open + 1..close]
                        .iter()
                        .copied()
                        .filter(|n| !matches!(n.kind(), "," | ";"))
                        .collect();
                    if !members.is_empty() {
                        let mut list = Span {
                            source,
                            kind: MEMBER_LIST,
                            start: members[0].start_byte(),
                            end: members[members.len() - 1].end_byte(),
                            sep_start: members[members.len() - 1].end_byte(),
                            sep_end: members[members.len() - 1].end_byte(),
                            children: members
                                .iter()
                                .map(|n| Self::from_node(source, *n))
                                .collect(),
                            modification: SpanModification::default(),
                        };
                        assign_separators(&mut list.children);
                        span.children.push(list);
                    }
                    for n in &child_nodes[close..] {
                        span.children.push(Self::from_node(source, *n));
                    }
                    assign_separators(&mut span.children);
                    return span;
                }
            }
        }

        for n in &child_nodes {
            span.children.push(Self::from_node(source, *n));
        }
        assign_separators(&mut span.children);
        span
    }

    /// Text from the span start to the first child (the whole extent when
    /// childless).
    pub fn prefix(&self) -> &'a str {
        match self.children.first() {
            Some(first) => &self.source[self.start..first.start],
            None => &self.source[self.start..self.end],
        }
    }

    /// Text after the last child up to the span end.
    pub fn suffix(&self) -> &'a str {
        match self.children.last() {
            Some(last) => &self.source[last.end..self.end],
            None => "",
        }
    }

    /// Trivia between this span's extent and the next lexical token.
    pub fn separator(&self) -> &'a str {
        &self.source[self.sep_start..self.sep_end]
    }

    /// This span's separator, or recursively its last child's.
    pub fn last_inner_separator(&self) -> &'a str {
        if !self.separator().is_empty() {
            return self.separator();
        }
        match self.children.last() {
            Some(last) => last.last_inner_separator(),
            None => "",
        }
    }

    /// Original source text: prefix + children + suffix + separator.
    pub fn get_text(&self) -> String {
        let mut out = String::new();
        self.write_original(&mut out);
        out
    }

    fn write_original(&self, out: &mut String) {
        out.push_str(self.prefix());
        for child in &self.children {
            child.write_original(out);
        }
        out.push_str(self.suffix());
        out.push_str(self.separator());
    }

    /// Emit with all modifications applied, in a single post-order pass.
    pub fn get_modified_text(&self) -> String {
        let mut out = String::new();
        self.write_modified(&mut out, None);
        out
    }

    /// Suppress the span entirely: no prefix, children, suffix, or
    /// separator.
    pub fn skip_all(&mut self) {
        self.modification.prefix = Some(String::new());
        self.modification.suffix = Some(String::new());
        self.modification.omit_children = true;
        self.modification.omit_separator = true;
    }

    /// Find the child span wrapping a given node extent, recursively.
    pub fn find_span_mut(&mut self, start: usize, end: usize, kind: &str) -> Option<&mut Span<'a>> {
        if self.start == start && self.end == end && self.kind == kind {
            return Some(self);
        }
        for child in &mut self.children {
            if child.start <= start && end <= child.end {
                if let Some(found) = child.find_span_mut(start, end, kind) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn write_modified(&self, out: &mut String, separator_override: Option<&str>) {
        // An inherited override is consumed where the trailing gap lives:
        // at the first span along the last-child chain with a non-empty
        // separator, or at a leaf.
        let consumed_here =
            separator_override.is_some() && (!self.separator().is_empty() || self.children.is_empty());

        match &self.modification.prefix {
            Some(prefix) => out.push_str(prefix),
            None => out.push_str(self.prefix()),
        }

        if !self.modification.omit_children {
            if self.modification.sort_children && self.children.len() >= 2 {
                self.write_sorted_children(out, separator_override, consumed_here);
            } else {
                let child_override = if consumed_here { None } else { separator_override };
                let count = self.children.len();
                for (i, child) in self.children.iter().enumerate() {
                    let inherited = if i + 1 == count { child_override } else { None };
                    child.write_modified(out, inherited);
                }
            }
        }

        match &self.modification.suffix {
            Some(suffix) => out.push_str(suffix),
            None => out.push_str(self.suffix()),
        }

        if let Some(sep) = separator_override {
            if consumed_here && !self.modification.omit_separator {
                out.push_str(sep);
            }
        } else if !self.modification.omit_separator {
            out.push_str(self.separator());
        }
    }

    fn write_sorted_children(
        &self,
        out: &mut String,
        separator_override: Option<&str>,
        consumed_here: bool,
    ) {
        // Indentation fixup: every re-ordered child except the last takes
        // the first child's trailing separator; the last takes the last
        // child's. First/last refer to source order.
        let first_sep = self
            .children
            .first()
            .map(|c| c.last_inner_separator())
            .unwrap_or("");
        let default_last_sep = self
            .children
            .last()
            .map(|c| c.last_inner_separator())
            .unwrap_or("");
        let last_sep = match separator_override {
            Some(sep) if !consumed_here => sep,
            _ => default_last_sep,
        };

        let mut keyed: Vec<&Span<'a>> = Vec::new();
        let mut keyless: Vec<&Span<'a>> = Vec::new();
        for child in &self.children {
            if child.modification.sort_key.is_some() {
                keyed.push(child);
            } else {
                keyless.push(child);
            }
        }
        keyed.sort_by(|a, b| a.modification.sort_key.cmp(&b.modification.sort_key));

        let ordered: Vec<&Span<'a>> = keyed.into_iter().chain(keyless).collect();
        let count = ordered.len();
        for (i, child) in ordered.iter().enumerate() {
            let sep = if i + 1 == count { last_sep } else { first_sep };
            child.write_modified(out, Some(sep));
        }
    }

    /// Extent end including separators pushed into descendants.
    fn end_including_separator(&self) -> usize {
        let deepest = self
            .children
            .last()
            .map(|c| c.end_including_separator())
            .unwrap_or(self.start);
        self.end.max(self.sep_end).max(deepest)
    }

    /// Verify the coverage invariant: segments are contiguous,
    /// non-overlapping, and cover the extent plus separator. Used by tests
    /// and debug assertions.
    pub fn check_coverage(&self) -> Result<(), String> {
        if let Some(first) = self.children.first() {
            if first.start < self.start {
                return Err(format!(
                    "child {} starts before parent {}",
                    first.kind, self.kind
                ));
            }
        }
        let mut position = None;
        for child in &self.children {
            if let Some(expected) = position {
                if child.start != expected {
                    return Err(format!(
                        "gap before child {} of {} at {} (expected {})",
                        child.kind, self.kind, child.start, expected
                    ));
                }
            }
            child.check_coverage()?;
            position = Some(child.end_including_separator());
        }
        if let Some(last_end) = position {
            if last_end > self.end && self.suffix().is_empty() && self.separator().is_empty() {
                // Separators pushed down from an ancestor may extend past
                // this span's extent; the ancestor accounts for them.
            } else if last_end > self.end.max(self.sep_end) {
                return Err(format!("children overrun span {}", self.kind));
            }
        }
        Ok(())
    }
}

/// Assign the gap between adjacent siblings as a separator, pushed into
/// the deepest preceding span with an empty suffix.
fn assign_separators(children: &mut [Span<'_>]) {
    for i in 0..children.len().saturating_sub(1) {
        let gap_start = children[i].end;
        let gap_end = children[i + 1].start;
        if gap_end > gap_start {
            push_down_separator(&mut children[i], gap_start, gap_end);
        }
    }
}

fn push_down_separator(span: &mut Span<'_>, start: usize, end: usize) {
    if !span.suffix().is_empty() || span.children.is_empty() {
        span.sep_start = start;
        span.sep_end = end;
        return;
    }
    push_down_separator(span.children.last_mut().expect("non-empty"), start, end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(source: &str) -> SourceFile {
        SourceFile::parse(Path::new("test.ts"), "test.ts".to_string(), source.to_string()).unwrap()
    }

    fn decl_span<'a>(file: &'a SourceFile, index: usize) -> Span<'a> {
        let node = file.root().named_child(index).unwrap();
        Span::build(file, node)
    }

    #[test]
    fn test_round_trip_simple_class() {
        let source = "class Widget {\n  render(): void;\n  size: number;\n}\n";
        let file = parse(source);
        let node = file.root().named_child(0).unwrap();
        let span = Span::build(&file, node);
        assert_eq!(span.get_text(), file.node_text(node));
        span.check_coverage().unwrap();
    }

    #[test]
    fn test_round_trip_varied_shapes() {
        let sources = [
            "interface I { a: string; b: number; }\n",
            "enum E {\n  A = 1,\n  B,\n}\n",
            "namespace N {\n  export const x: number = 1;\n}\n",
            "declare function f(a: string, b?: number): Map<string, number>;\n",
            "type T = { x: number } | string;\n",
        ];
        for source in sources {
            let file = parse(source);
            let root = file.root();
            let mut cursor = root.walk();
            for node in root.children(&mut cursor) {
                let span = Span::build(&file, node);
                assert_eq!(span.get_text(), file.node_text(node), "source: {}", source);
                span.check_coverage().unwrap();
            }
        }
    }

    #[test]
    fn test_unmodified_emission_matches_original() {
        let source = "class C {\n  a(): void;\n  b(): void;\n}";
        let file = parse(source);
        let span = decl_span(&file, 0);
        assert_eq!(span.get_modified_text(), span.get_text());
    }

    #[test]
    fn test_prefix_suffix_override() {
        let source = "const answer: number = 42;";
        let file = parse(source);
        let decl = file.root().named_child(0).unwrap();
        let declarator = decl
            .child_by_field_name("declarator")
            .or_else(|| decl.named_child(0))
            .unwrap();

        let mut span = Span::build(&file, declarator);
        span.modification.prefix = Some(format!("declare const {}", span.prefix()));
        span.modification.suffix = Some(";".to_string());
        assert_eq!(span.get_modified_text(), "declare const answer: number = 42;");
    }

    #[test]
    fn test_skip_all_drops_separator() {
        let source = "export class A {}";
        let file = parse(source);
        let export_stmt = file.root().named_child(0).unwrap();
        let mut span = Span::build(&file, export_stmt);

        // Skip the `export` keyword; its trailing space goes with it.
        let export_kw = span
            .children
            .iter_mut()
            .find(|c| c.kind == "export")
            .unwrap();
        export_kw.skip_all();
        assert_eq!(span.get_modified_text(), "class A {}");
    }

    #[test]
    fn test_sort_children_restitches_separators() {
        let source = "interface I {\n  zebra: string;\n  alpha: number;\n  middle: boolean;\n}";
        let file = parse(source);
        let mut span = decl_span(&file, 0);

        let list = find_list(&mut span).expect("member list");
        list.modification.sort_children = true;
        for child in &mut list.children {
            let name = child.prefix().split(':').next().unwrap().trim().to_string();
            child.modification.sort_key = Some(name);
        }

        let text = span.get_modified_text();
        let alpha = text.find("alpha").unwrap();
        let middle = text.find("middle").unwrap();
        let zebra = text.find("zebra").unwrap();
        assert!(alpha < middle && middle < zebra, "got: {}", text);
        // Every member stays on its own indented line.
        assert_eq!(text.matches("\n  ").count(), 3, "got: {:?}", text);
        assert!(text.ends_with("\n}"), "got: {:?}", text);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let source = "interface I {\n  first: string;\n  second: number;\n}";
        let file = parse(source);
        let mut span = decl_span(&file, 0);
        let list = find_list(&mut span).expect("member list");
        list.modification.sort_children = true;
        for child in &mut list.children {
            child.modification.sort_key = Some("same".to_string());
        }
        let text = span.get_modified_text();
        assert!(text.find("first").unwrap() < text.find("second").unwrap());
    }

    #[test]
    fn test_keyless_children_sort_last_in_order() {
        let source = "interface I {\n  b: string;\n  a: number;\n}";
        let file = parse(source);
        let mut span = decl_span(&file, 0);
        let list = find_list(&mut span).expect("member list");
        list.modification.sort_children = true;
        // Only `b` gets a key; `a` stays keyless and is emitted last.
        list.children[0].modification.sort_key = Some("b".to_string());
        let text = span.get_modified_text();
        assert!(text.find("b:").unwrap() < text.find("a:").unwrap());
    }

    fn find_list<'s, 'a>(span: &'s mut Span<'a>) -> Option<&'s mut Span<'a>> {
        if span.kind == MEMBER_LIST {
            return Some(span);
        }
        for child in &mut span.children {
            if let Some(found) = find_list(child) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn test_member_list_groups_between_braces() {
        let source = "enum E { A, B, C }";
        let file = parse(source);
        let span = decl_span(&file, 0);
        assert_eq!(span.get_text(), source);

        fn count_lists(span: &Span) -> usize {
            span.children.iter().map(count_lists).sum::<usize>()
                + usize::from(span.kind == MEMBER_LIST)
        }
        assert_eq!(count_lists(&span), 1);
    }
}
