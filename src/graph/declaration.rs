//! Graph node for one syntactic declaration site.

use tree_sitter::Node;

use super::symbol::{AstDeclarationId, AstSymbolId};
use crate::facade::{NodeKey, SourceFile};

/// One declaration site of an [`crate::graph::AstSymbol`].
///
/// Overloaded functions and merged interfaces/namespaces give a symbol more
/// than one declaration. The parent link points at the enclosing
/// declaration node, not the enclosing syntax node: non-qualifying
/// intermediates (bodies, lists) are skipped.
#[derive(Debug)]
pub struct AstDeclaration {
    pub node: NodeKey,
    pub symbol: AstSymbolId,
    pub parent: Option<AstDeclarationId>,
    pub children: Vec<AstDeclarationId>,
    /// Referenced symbols, deduplicated by identity, in discovery order.
    /// Never contains the declaration's own symbol or an ancestor's.
    pub referenced: Vec<AstSymbolId>,
}

/// Syntax kinds that qualify as declaration sites.
pub fn is_declaration_kind(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "abstract_class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "internal_module"
            | "module"
            | "function_declaration"
            | "function_signature"
            | "method_definition"
            | "method_signature"
            | "abstract_method_signature"
            | "public_field_definition"
            | "property_signature"
            | "variable_declarator"
            | "type_alias_declaration"
            | "index_signature"
            | "call_signature"
            | "construct_signature"
            | "enum_assignment"
    )
}

/// Whether a node is a declaration site, including bare enum members.
pub fn is_declaration_node(node: Node) -> bool {
    if is_declaration_kind(node.kind()) {
        return true;
    }
    node.kind() == "property_identifier"
        && node
            .parent()
            .map(|p| p.kind() == "enum_body")
            .unwrap_or(false)
}

/// Function-like declaration kinds (overloads repeat per site).
pub fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "function_signature"
            | "method_definition"
            | "method_signature"
            | "abstract_method_signature"
    )
}

/// Namespace-like declaration kinds.
pub fn is_namespace_kind(kind: &str) -> bool {
    matches!(kind, "internal_module" | "module")
}

/// Member kinds that may carry `@virtual` / `@override`.
pub fn is_overridable_member(kind: &str) -> bool {
    matches!(
        kind,
        "method_definition"
            | "method_signature"
            | "abstract_method_signature"
            | "public_field_definition"
    )
}

/// Enum member declarations.
pub fn is_enum_member(node: Node) -> bool {
    node.kind() == "enum_assignment"
        || (node.kind() == "property_identifier"
            && node
                .parent()
                .map(|p| p.kind() == "enum_body")
                .unwrap_or(false))
}

/// Whether a declaration node names a constructor.
pub fn is_constructor(file: &SourceFile, node: Node) -> bool {
    node.kind() == "method_definition"
        && node
            .child_by_field_name("name")
            .map(|n| file.node_text(n) == "constructor")
            .unwrap_or(false)
}

/// The local name of a declaration site.
///
/// Unnamed signature members get the compiler-style synthetic names.
pub fn declaration_name(file: &SourceFile, node: Node) -> String {
    match node.kind() {
        "index_signature" => "__index".to_string(),
        "call_signature" => "__call".to_string(),
        "construct_signature" => "__new".to_string(),
        "property_identifier" => file.node_text(node).to_string(),
        _ => match node.child_by_field_name("name") {
            Some(name) => file
                .node_text(name)
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string(),
            None => "(anonymous)".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(source: &str) -> SourceFile {
        SourceFile::parse(Path::new("test.ts"), "test.ts".to_string(), source.to_string()).unwrap()
    }

    #[test]
    fn test_declaration_kinds() {
        assert!(is_declaration_kind("class_declaration"));
        assert!(is_declaration_kind("variable_declarator"));
        assert!(!is_declaration_kind("statement_block"));
        assert!(!is_declaration_kind("lexical_declaration"));
    }

    #[test]
    fn test_constructor_detection() {
        let file = parse("class C {\n  constructor(a: number) {}\n  render(): void {}\n}\n");
        let class_decl = file.root().named_child(0).unwrap();
        let body = class_decl.child_by_field_name("body").unwrap();

        let mut found_ctor = false;
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "method_definition" {
                let name = declaration_name(&file, member);
                if name == "constructor" {
                    assert!(is_constructor(&file, member));
                    found_ctor = true;
                } else {
                    assert!(!is_constructor(&file, member));
                }
            }
        }
        assert!(found_ctor);
    }

    #[test]
    fn test_enum_member_names() {
        let file = parse("enum Status {\n  Active = 1,\n  Inactive\n}\n");
        let enum_decl = file.root().named_child(0).unwrap();
        let body = enum_decl.child_by_field_name("body").unwrap();

        let mut names = Vec::new();
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if is_enum_member(member) {
                names.push(declaration_name(&file, member));
            }
        }
        assert_eq!(names, vec!["Active", "Inactive"]);
    }
}
