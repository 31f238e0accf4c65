//! Review file generation.
//!
//! Emits one block per exported declaration: an optional synopsis comment
//! line followed by the declaration text rewritten through the span tree.
//! The output is canonical modulo whitespace, so semantically equivalent
//! edits produce diff-identical review files.

use crate::collector::Collector;
use crate::facade::{is_reference_position, FileId, NodeKey};
use crate::graph::{is_declaration_kind, is_function_like, AstDeclarationId};
use crate::span::{Span, MEMBER_LIST};

/// Generate the review file for the collected surface.
pub fn generate_review_file(collector: &mut Collector) -> String {
    let mut out = String::new();

    let exported: Vec<AstDeclarationId> = collector
        .entities()
        .iter()
        .filter(|e| e.exported)
        .flat_map(|e| collector.graph.symbol(e.symbol).declarations.clone())
        .collect();

    for decl_id in exported {
        let synopsis = build_synopsis(collector, decl_id, false);
        if !synopsis.is_empty() {
            out.push_str("// ");
            out.push_str(&synopsis);
            out.push('\n');
        }
        out.push_str(&emit_declaration(collector, decl_id));
        out.push_str("\n\n");
    }

    if collector.package_doc.is_none() {
        out.push_str("// (No @packageDocumentation comment for this package)\n");
    }

    out
}

/// Two review files are equivalent iff collapsing every whitespace run to
/// a single space yields identical strings.
pub fn are_equivalent_api_file_contents(a: &str, b: &str) -> bool {
    fn collapsed(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut in_whitespace = false;
        for c in s.chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    out.push(' ');
                }
                in_whitespace = true;
            } else {
                out.push(c);
                in_whitespace = false;
            }
        }
        out
    }
    collapsed(a) == collapsed(b)
}

/// Build the synopsis token line for a declaration. Empty when no tokens
/// apply.
fn build_synopsis(collector: &mut Collector, decl_id: AstDeclarationId, nested: bool) -> String {
    let symbol = collector.graph.declaration(decl_id).symbol;
    let kind = collector.graph.declaration(decl_id).node.kind;
    let index = collector
        .graph
        .symbol(symbol)
        .declarations
        .iter()
        .position(|&d| d == decl_id)
        .unwrap_or(0);

    let symbol_meta = collector.fetch_symbol_metadata(symbol);
    let decl_meta = collector.fetch_declaration_metadata(decl_id);

    let mut tokens: Vec<&str> = Vec::new();

    // Overload sites repeat the tag; other merged declarations carry it on
    // the first block only. Members whose tag matches the parent stay
    // untagged.
    let repeat_ok = index == 0 || is_function_like(kind);
    let emit_tag = if nested {
        !symbol_meta.release_tag_same_as_parent && repeat_ok
    } else {
        repeat_ok
    };
    if emit_tag {
        if let Some(tag) = symbol_meta.release_tag.tag_name() {
            tokens.push(tag);
        }
    }

    if decl_meta.is_sealed {
        tokens.push("@sealed");
    }
    if decl_meta.is_virtual {
        tokens.push("@virtual");
    }
    if decl_meta.is_override {
        tokens.push("@override");
    }
    if decl_meta.is_event_property {
        tokens.push("@eventproperty");
    }
    if decl_meta.is_deprecated {
        tokens.push("@deprecated");
    }
    if decl_meta.needs_documentation {
        tokens.push("(undocumented)");
    }

    tokens.join(" ")
}

/// Emit one declaration through the span rewriter.
fn emit_declaration(collector: &mut Collector, decl_id: AstDeclarationId) -> String {
    let node_key = collector.graph.declaration(decl_id).node;
    let file_id = node_key.file;
    let program = collector.program;
    let file = program.file(file_id);
    let node = file.node_at(node_key);

    let mut span = Span::build(file, node);

    // Top-level variables lose their declaration list during analysis;
    // reconstruct the canonical `declare <keyword>` head and the trailing
    // semicolon. The keyword is taken literally from source.
    if node.kind() == "variable_declarator" && collector.graph.declaration(decl_id).parent.is_none()
    {
        if let Some(list_node) = node.parent() {
            let keyword = list_node
                .child(0)
                .map(|k| file.node_text(k))
                .unwrap_or("const");
            span.modification.prefix = Some(format!("declare {} {}", keyword, span.prefix()));
            span.modification.suffix = Some(";".to_string());
        }
    }

    walk(&mut span, collector, file_id, decl_id);
    span.get_modified_text()
}

/// Apply per-kind span modifications, carrying the enclosing declaration
/// context through the tree.
fn walk(
    span: &mut Span<'_>,
    collector: &mut Collector,
    file_id: FileId,
    current_decl: AstDeclarationId,
) {
    let mut decl_ctx = current_decl;

    if span.kind != MEMBER_LIST {
        let key = NodeKey {
            file: file_id,
            start: span.start,
            end: span.end,
            kind: span.kind,
        };
        if let Some(decl) = collector.graph.declaration_for_node(key) {
            decl_ctx = decl;
        }
    }

    match span.kind {
        "comment" => {
            if span.prefix().starts_with("/**") {
                span.skip_all();
            }
            return;
        }
        MEMBER_LIST => {
            span.modification.sort_children = true;
            for child in &mut span.children {
                let Some(member_decl) = find_declaration_in(collector, file_id, child) else {
                    continue;
                };
                let name = collector
                    .graph
                    .symbol(collector.graph.declaration(member_decl).symbol)
                    .local_name
                    .clone();
                child.modification.sort_key =
                    Some(Collector::get_sort_key_ignoring_underscore(&name));
                // The synopsis travels with the member: injected into its
                // prefix, re-indented to the member's source column.
                inject_synopsis(child, collector, file_id, member_decl);
            }
        }
        "type_identifier" | "identifier" => {
            let key = NodeKey {
                file: file_id,
                start: span.start,
                end: span.end,
                kind: span.kind,
            };
            let node = collector.program.node_at(key);
            if is_reference_position(node) {
                let name = span.prefix().to_string();
                if let Some(entity) = collector.entity_for_type_name(file_id, &name) {
                    if entity.name_for_emit != name {
                        span.modification.prefix = Some(entity.name_for_emit.clone());
                    }
                }
            }
            return;
        }
        _ => {}
    }

    // Export statements inside namespace bodies keep only the declaration.
    if span.kind == "export_statement" {
        for child in &mut span.children {
            if matches!(child.kind, "export" | "default") {
                child.skip_all();
            }
        }
    }

    for child in &mut span.children {
        walk(child, collector, file_id, decl_ctx);
    }
}

/// Prepend the synopsis comment to a member's prefix, re-indented to its
/// source column.
fn inject_synopsis(
    span: &mut Span<'_>,
    collector: &mut Collector,
    file_id: FileId,
    decl: AstDeclarationId,
) {
    let synopsis = build_synopsis(collector, decl, true);
    if synopsis.is_empty() {
        return;
    }
    let indent = collector
        .program
        .file(file_id)
        .line_indent(span.start)
        .to_string();
    let existing = span
        .modification
        .prefix
        .take()
        .unwrap_or_else(|| span.prefix().to_string());
    span.modification.prefix = Some(format!("// {}\n{}{}", synopsis, indent, existing));
}

/// The declaration a member-list child stands for: the child itself, or
/// the declaration wrapped inside its `export`/`declare` statement.
fn find_declaration_in(
    collector: &Collector,
    file_id: FileId,
    span: &Span<'_>,
) -> Option<AstDeclarationId> {
    if is_declaration_kind(span.kind) || span.kind == "property_identifier" {
        let key = NodeKey {
            file: file_id,
            start: span.start,
            end: span.end,
            kind: span.kind,
        };
        if let Some(decl) = collector.graph.declaration_for_node(key) {
            return Some(decl);
        }
    }
    for child in &span.children {
        if let Some(found) = find_declaration_in(collector, file_id, child) {
            return Some(found);
        }
    }
    None
}
