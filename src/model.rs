//! API model: a serializable tree of documented items.
//!
//! Items are dispatched by kind over a shared base record; capability
//! fields (doc comment, release tag, excerpt tokens, members) are optional
//! and omitted from the JSON when absent. Canonical references compose
//! hierarchically: `(pkg:package).(:entrypoint).(Widget:class).(render:method)`.

use serde::{Deserialize, Serialize};

use crate::collector::Collector;
use crate::facade::NodeKey;
use crate::graph::{is_constructor, is_function_like, is_namespace_kind, AstDeclarationId, AstSymbolId};
use crate::metadata::ReleaseTag;
use tree_sitter::Node;

/// Kinds of documented items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiItemKind {
    Package,
    EntryPoint,
    Class,
    Interface,
    Namespace,
    Method,
    MethodSignature,
    Property,
    PropertySignature,
    Function,
    Enum,
    EnumMember,
    Constructor,
    ConstructorSignature,
    IndexSignature,
    CallSignature,
    TypeAlias,
    Variable,
}

impl ApiItemKind {
    /// The lowercase fragment used inside canonical references.
    pub fn canonical_fragment(&self) -> &'static str {
        match self {
            ApiItemKind::Package => "package",
            ApiItemKind::EntryPoint => "entrypoint",
            ApiItemKind::Class => "class",
            ApiItemKind::Interface => "interface",
            ApiItemKind::Namespace => "namespace",
            ApiItemKind::Method => "method",
            ApiItemKind::MethodSignature => "methodSignature",
            ApiItemKind::Property => "property",
            ApiItemKind::PropertySignature => "propertySignature",
            ApiItemKind::Function => "function",
            ApiItemKind::Enum => "enum",
            ApiItemKind::EnumMember => "enumMember",
            ApiItemKind::Constructor => "constructor",
            ApiItemKind::ConstructorSignature => "constructorSignature",
            ApiItemKind::IndexSignature => "indexSignature",
            ApiItemKind::CallSignature => "callSignature",
            ApiItemKind::TypeAlias => "typeAlias",
            ApiItemKind::Variable => "variable",
        }
    }
}

/// One fragment of a declaration's signature text. Reference tokens link
/// to other items by canonical reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcerptToken {
    pub kind: ExcerptTokenKind,
    pub text: String,
    #[serde(
        rename = "canonicalReference",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub canonical_reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcerptTokenKind {
    Content,
    Reference,
}

/// One node of the API model tree.
///
/// Every item belongs to exactly one container; the tree is built in a
/// single pass and never re-parented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiItem {
    pub kind: ApiItemKind,
    pub name: String,
    #[serde(rename = "canonicalReference")]
    pub canonical_reference: String,
    #[serde(rename = "docComment", default, skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    #[serde(rename = "releaseTag", default, skip_serializing_if = "Option::is_none")]
    pub release_tag: Option<String>,
    #[serde(
        rename = "excerptTokens",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub excerpt_tokens: Vec<ExcerptToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ApiItem>,
}

/// The serialized document: tool metadata plus the package tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDocument {
    pub metadata: ApiMetadata,
    pub package: ApiItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMetadata {
    pub tool: String,
    #[serde(rename = "toolVersion")]
    pub tool_version: String,
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
}

/// Build the API model for the collected surface.
pub fn build_api_model(collector: &mut Collector, package_name: &str) -> ApiDocument {
    let package_canonical = format!("({}:package)", package_name);
    let entry_canonical = format!("{}.(:entrypoint)", package_canonical);

    let mut entry_members = Vec::new();
    let exported: Vec<AstSymbolId> = collector
        .entities()
        .iter()
        .filter(|e| e.exported)
        .map(|e| e.symbol)
        .collect();
    for symbol in exported {
        entry_members.extend(build_items_for_symbol(
            collector,
            symbol,
            &entry_canonical,
            &entry_canonical.clone(),
        ));
    }

    let entry_point = ApiItem {
        kind: ApiItemKind::EntryPoint,
        name: String::new(),
        canonical_reference: entry_canonical,
        doc_comment: None,
        release_tag: None,
        excerpt_tokens: Vec::new(),
        members: entry_members,
    };

    let package = ApiItem {
        kind: ApiItemKind::Package,
        name: package_name.to_string(),
        canonical_reference: package_canonical,
        doc_comment: collector.package_doc.as_ref().map(|d| d.raw.clone()),
        release_tag: None,
        excerpt_tokens: Vec::new(),
        members: vec![entry_point],
    };

    ApiDocument {
        metadata: ApiMetadata {
            tool: "surfacer".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: 1,
        },
        package,
    }
}

/// Items for one symbol: one item per overload site for function-like
/// symbols, one merged item otherwise.
fn build_items_for_symbol(
    collector: &mut Collector,
    symbol: AstSymbolId,
    parent_canonical: &str,
    entry_canonical: &str,
) -> Vec<ApiItem> {
    let decls = collector.graph.symbol(symbol).declarations.clone();
    if decls.is_empty() {
        return Vec::new();
    }

    let all_function_like = decls
        .iter()
        .all(|&d| is_function_like(collector.graph.declaration(d).node.kind));

    if all_function_like && decls.len() > 1 {
        return decls
            .iter()
            .enumerate()
            .map(|(i, &decl)| {
                build_item(collector, symbol, &[decl], parent_canonical, entry_canonical, i)
            })
            .collect();
    }
    vec![build_item(collector, symbol, &decls, parent_canonical, entry_canonical, 0)]
}

fn build_item(
    collector: &mut Collector,
    symbol: AstSymbolId,
    decls: &[AstDeclarationId],
    parent_canonical: &str,
    entry_canonical: &str,
    overload_index: usize,
) -> ApiItem {
    let first = decls[0];
    let kind = item_kind(collector, first);
    let name = display_name(collector, symbol);

    let canonical = if overload_index > 0 {
        format!(
            "{}.({}:{},{})",
            parent_canonical,
            name,
            kind.canonical_fragment(),
            overload_index + 1
        )
    } else {
        format!("{}.({}:{})", parent_canonical, name, kind.canonical_fragment())
    };

    let doc_comment = decls.iter().find_map(|&d| {
        collector
            .fetch_declaration_metadata(d)
            .doc
            .as_ref()
            .map(|doc| doc.raw.clone())
    });

    let release_tag = match collector.fetch_symbol_metadata(symbol).release_tag {
        ReleaseTag::None => None,
        tag => Some(tag.as_str().to_string()),
    };

    // Member symbols across all merged declaration sites, in order of
    // first appearance.
    let mut member_symbols: Vec<AstSymbolId> = Vec::new();
    for &decl in decls {
        for &child in &collector.graph.declaration(decl).children.clone() {
            let child_symbol = collector.graph.declaration(child).symbol;
            if !member_symbols.contains(&child_symbol) {
                member_symbols.push(child_symbol);
            }
        }
    }
    let mut members = Vec::new();
    for member in member_symbols {
        members.extend(build_items_for_symbol(collector, member, &canonical, entry_canonical));
    }

    ApiItem {
        kind,
        name,
        canonical_reference: canonical,
        doc_comment,
        release_tag,
        excerpt_tokens: excerpt_tokens(collector, first, entry_canonical),
        members,
    }
}

/// The emit name for entity symbols, the local name for members.
fn display_name(collector: &Collector, symbol: AstSymbolId) -> String {
    match collector.try_get_entity_by_symbol(symbol) {
        Some(entity) => entity.name_for_emit.clone(),
        None => collector.graph.symbol(symbol).local_name.clone(),
    }
}

fn item_kind(collector: &Collector, decl: AstDeclarationId) -> ApiItemKind {
    let node_key = collector.graph.declaration(decl).node;
    match node_key.kind {
        "class_declaration" | "abstract_class_declaration" => ApiItemKind::Class,
        "interface_declaration" => ApiItemKind::Interface,
        "internal_module" | "module" => ApiItemKind::Namespace,
        "method_definition" => {
            let file = collector.program.file(node_key.file);
            if is_constructor(file, file.node_at(node_key)) {
                ApiItemKind::Constructor
            } else {
                ApiItemKind::Method
            }
        }
        "method_signature" | "abstract_method_signature" => ApiItemKind::MethodSignature,
        "public_field_definition" => ApiItemKind::Property,
        "property_signature" => ApiItemKind::PropertySignature,
        "function_declaration" | "function_signature" => ApiItemKind::Function,
        "enum_declaration" => ApiItemKind::Enum,
        "enum_assignment" | "property_identifier" => ApiItemKind::EnumMember,
        "construct_signature" => ApiItemKind::ConstructorSignature,
        "index_signature" => ApiItemKind::IndexSignature,
        "call_signature" => ApiItemKind::CallSignature,
        "type_alias_declaration" => ApiItemKind::TypeAlias,
        "variable_declarator" => ApiItemKind::Variable,
        _ => ApiItemKind::Variable,
    }
}

/// Split a declaration's text into content fragments and references to
/// other collected entities.
fn excerpt_tokens(
    collector: &mut Collector,
    decl: AstDeclarationId,
    entry_canonical: &str,
) -> Vec<ExcerptToken> {
    let node_key = collector.graph.declaration(decl).node;
    let file = collector.program.file(node_key.file);
    let node = file.node_at(node_key);

    let mut references: Vec<(usize, usize, String)> = Vec::new();
    collect_reference_ranges(collector, node_key, node, entry_canonical, &mut references);
    references.sort_by_key(|&(start, _, _)| start);

    let text = file.node_text(node);
    let base = node.start_byte();
    let mut tokens = Vec::new();
    let mut position = 0;
    for (start, end, canonical) in references {
        let rel_start = start - base;
        let rel_end = end - base;
        if rel_start > position {
            tokens.push(ExcerptToken {
                kind: ExcerptTokenKind::Content,
                text: text[position..rel_start].to_string(),
                canonical_reference: None,
            });
        }
        tokens.push(ExcerptToken {
            kind: ExcerptTokenKind::Reference,
            text: text[rel_start..rel_end].to_string(),
            canonical_reference: Some(canonical),
        });
        position = rel_end;
    }
    if position < text.len() {
        tokens.push(ExcerptToken {
            kind: ExcerptTokenKind::Content,
            text: text[position..].to_string(),
            canonical_reference: None,
        });
    }
    tokens
}

fn collect_reference_ranges(
    collector: &Collector,
    root_key: NodeKey,
    node: Node,
    entry_canonical: &str,
    out: &mut Vec<(usize, usize, String)>,
) {
    if node.kind() == "comment" {
        return;
    }
    if node.kind() == "statement_block" {
        let namespace_body = node
            .parent()
            .map(|p| is_namespace_kind(p.kind()))
            .unwrap_or(false);
        if !namespace_body {
            return;
        }
    }
    if crate::facade::is_reference_position(node) {
        let file = collector.program.file(root_key.file);
        let name = file.node_text(node);
        if let Some(entity) = collector.entity_for_type_name(root_key.file, name) {
            let target_kind = collector
                .graph
                .symbol(entity.symbol)
                .declarations
                .first()
                .map(|&d| item_kind(collector, d))
                .unwrap_or(ApiItemKind::Variable);
            let canonical = format!(
                "{}.({}:{})",
                entry_canonical,
                entity.name_for_emit,
                target_kind.canonical_fragment()
            );
            out.push((node.start_byte(), node.end_byte(), canonical));
            return;
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_reference_ranges(collector, root_key, child, entry_canonical, out);
    }
}
