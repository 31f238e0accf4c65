//! Metadata pass: doc comments, release tags, and semantic checks.
//!
//! Declaration metadata is computed from the declaration's own doc comment.
//! Symbol metadata resolves the effective release tag across all of a
//! symbol's declarations, inheriting from the nearest ancestor when the
//! declarations carry none. Semantic findings are appended to the
//! collector's message list, never thrown.

use serde::{Deserialize, Serialize};

use crate::aedoc::{self, DocComment};
use crate::collector::Collector;
use crate::facade::Program;
use crate::graph::{
    is_constructor, is_enum_member, is_function_like, is_namespace_kind, is_overridable_member,
    AstDeclarationId, AstGraph, AstSymbolId,
};
use crate::messages::{ExtractorMessage, MessageId};

/// API stability of a symbol.
///
/// Ordered by visibility: `Public > Beta > Alpha > Internal > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReleaseTag {
    None,
    Internal,
    Alpha,
    Beta,
    Public,
}

impl ReleaseTag {
    /// The doc-comment modifier spelling, e.g. `@public`.
    pub fn tag_name(&self) -> Option<&'static str> {
        match self {
            ReleaseTag::None => None,
            ReleaseTag::Internal => Some("@internal"),
            ReleaseTag::Alpha => Some("@alpha"),
            ReleaseTag::Beta => Some("@beta"),
            ReleaseTag::Public => Some("@public"),
        }
    }

    pub fn from_tag_name(tag: &str) -> Option<ReleaseTag> {
        match tag {
            "@internal" => Some(ReleaseTag::Internal),
            "@alpha" => Some(ReleaseTag::Alpha),
            "@beta" => Some(ReleaseTag::Beta),
            "@public" => Some(ReleaseTag::Public),
            _ => None,
        }
    }

    /// Model-file spelling, e.g. `Public`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseTag::None => "None",
            ReleaseTag::Internal => "Internal",
            ReleaseTag::Alpha => "Alpha",
            ReleaseTag::Beta => "Beta",
            ReleaseTag::Public => "Public",
        }
    }
}

impl std::fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for one declaration site.
#[derive(Debug, Clone)]
pub struct DeclarationMetadata {
    pub doc: Option<DocComment>,
    pub is_sealed: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_event_property: bool,
    pub is_preapproved: bool,
    pub is_deprecated: bool,
    /// True unless the declaration is undocumented by policy, has a
    /// summary, or is `@internal`.
    pub needs_documentation: bool,
    /// Release tags declared on this site's comment, in tag order.
    pub declared_release_tags: Vec<ReleaseTag>,
}

/// Metadata for one symbol: the effective release tag across declarations.
#[derive(Debug, Clone)]
pub struct SymbolMetadata {
    pub release_tag: ReleaseTag,
    /// Whether the resolved tag equals the parent symbol's. Gates whether
    /// the review file re-emits the tag on the child.
    pub release_tag_same_as_parent: bool,
}

/// Compute metadata for a declaration from its doc comment.
pub fn compute_declaration_metadata(
    program: &Program,
    graph: &AstGraph,
    decl_id: AstDeclarationId,
) -> DeclarationMetadata {
    let decl = graph.declaration(decl_id);
    let file = program.file(decl.node.file);
    let doc = file.doc_comment_before(decl.node).map(|raw| aedoc::parse(&raw));

    let mut declared_release_tags = Vec::new();
    let mut is_sealed = false;
    let mut is_virtual = false;
    let mut is_override = false;
    let mut is_event_property = false;
    let mut is_preapproved = false;
    let mut is_deprecated = false;
    let mut has_summary = false;
    let mut is_internal = false;

    if let Some(doc) = &doc {
        for tag in [
            ReleaseTag::Internal,
            ReleaseTag::Alpha,
            ReleaseTag::Beta,
            ReleaseTag::Public,
        ] {
            if doc.has_modifier(tag.tag_name().unwrap()) {
                declared_release_tags.push(tag);
            }
        }
        is_sealed = doc.has_modifier("@sealed");
        is_virtual = doc.has_modifier("@virtual");
        is_override = doc.has_modifier("@override");
        is_event_property = doc.has_modifier("@eventProperty");
        is_preapproved = doc.has_modifier("@preapproved");
        is_deprecated = doc.block_tag("@deprecated").is_some();
        has_summary = doc.has_summary();
        is_internal = doc.has_modifier("@internal");
    }

    let node = file.node_at(decl.node);
    let index = graph
        .symbol(decl.symbol)
        .declarations
        .iter()
        .position(|&d| d == decl_id)
        .unwrap_or(0);
    let merged = graph.symbol(decl.symbol).declarations.len() > 1;

    let undocumented_by_policy = is_constructor(file, node)
        || is_enum_member(node)
        || (merged && index > 0 && is_function_like(decl.node.kind))
        || (merged && index > 0 && is_namespace_kind(decl.node.kind));

    DeclarationMetadata {
        doc,
        is_sealed,
        is_virtual,
        is_override,
        is_event_property,
        is_preapproved,
        is_deprecated,
        needs_documentation: !(undocumented_by_policy || has_summary || is_internal),
        declared_release_tags,
    }
}

/// Resolve the effective release tag for a symbol.
///
/// Exactly one declared tag wins. Differing tags raise a warning and fall
/// back to `Public`. No tags inherit from the nearest ancestor symbol; a
/// top-level symbol with no ancestor resolves to `None`.
pub fn compute_symbol_metadata(collector: &mut Collector, symbol: AstSymbolId) -> SymbolMetadata {
    let decl_ids = collector.graph.symbol(symbol).declarations.clone();

    let mut tags: Vec<ReleaseTag> = Vec::new();
    for decl_id in &decl_ids {
        let meta = collector.fetch_declaration_metadata(*decl_id);
        for tag in &meta.declared_release_tags {
            if !tags.contains(tag) {
                tags.push(*tag);
            }
        }
    }

    let parent = collector.graph.parent_symbol(symbol);
    let parent_tag = parent.map(|p| collector.fetch_symbol_metadata(p).release_tag);

    let release_tag = match tags.len() {
        1 => tags[0],
        0 => parent_tag.unwrap_or(ReleaseTag::None),
        _ => {
            let name = collector.graph.symbol(symbol).local_name.clone();
            let (file, line, col) = first_location(collector, symbol);
            collector.messages.push(
                ExtractorMessage::new(
                    MessageId::InconsistentReleaseTags,
                    format!(
                        "The declarations of \"{}\" have incompatible release tags; assuming @public",
                        name
                    ),
                    file,
                    line,
                    col,
                )
                .with_declaration(name.clone()),
            );
            ReleaseTag::Public
        }
    };

    SymbolMetadata {
        release_tag,
        release_tag_same_as_parent: parent_tag == Some(release_tag),
    }
}

fn first_location(collector: &Collector, symbol: AstSymbolId) -> (String, usize, usize) {
    match collector.graph.symbol(symbol).declarations.first() {
        Some(&decl) => collector
            .program
            .location(collector.graph.declaration(decl).node),
        None => (
            collector
                .program
                .file(collector.program.entry())
                .rel_path
                .clone(),
            1,
            1,
        ),
    }
}

/// Run the semantic checks over the collected surface.
///
/// Reports: missing release tags on exported entities, release tags outside
/// the allowed set, forgotten exports, type leaks across visibility
/// boundaries, and invalid `@override` / `@virtual` placement.
pub fn check_semantics(collector: &mut Collector, allowed_tags: &[ReleaseTag]) {
    let entities: Vec<_> = collector
        .entities()
        .iter()
        .map(|e| (e.symbol, e.exported, e.name_for_emit.clone()))
        .collect();

    for (symbol, exported, name) in &entities {
        let tag = collector.fetch_symbol_metadata(*symbol).release_tag;
        let (file, line, col) = first_location(collector, *symbol);

        if *exported && tag == ReleaseTag::None {
            collector.messages.push(
                ExtractorMessage::new(
                    MessageId::MissingReleaseTag,
                    format!(
                        "\"{}\" is missing a release tag (@alpha, @beta, @public, or @internal)",
                        name
                    ),
                    file.clone(),
                    line,
                    col,
                )
                .with_declaration(name.clone()),
            );
        }

        if tag != ReleaseTag::None && !allowed_tags.is_empty() && !allowed_tags.contains(&tag) {
            collector.messages.push(
                ExtractorMessage::new(
                    MessageId::DisallowedReleaseTag,
                    format!("The release tag {} is not allowed for this package", tag.tag_name().unwrap_or("(none)")),
                    file.clone(),
                    line,
                    col,
                )
                .with_declaration(name.clone()),
            );
        }

        if !*exported && !collector.graph.symbol(*symbol).nominal {
            collector.messages.push(
                ExtractorMessage::new(
                    MessageId::ForgottenExport,
                    format!(
                        "\"{}\" is reachable from the package's API but is not exported",
                        name
                    ),
                    file.clone(),
                    line,
                    col,
                )
                .with_declaration(name.clone()),
            );
        }

        // Per-declaration checks, recursively over members.
        let roots = collector.graph.symbol(*symbol).declarations.clone();
        for root in roots {
            check_declaration_tree(collector, root);
        }
    }
}

fn check_declaration_tree(collector: &mut Collector, decl_id: AstDeclarationId) {
    let (symbol, children, referenced, kind, node) = {
        let decl = collector.graph.declaration(decl_id);
        (
            decl.symbol,
            decl.children.clone(),
            decl.referenced.clone(),
            decl.node.kind,
            decl.node,
        )
    };

    let own_tag = collector.fetch_symbol_metadata(symbol).release_tag;
    let name = collector.graph.symbol(symbol).local_name.clone();

    // Type leaks: a declaration must not reference anything less public
    // than itself. Untagged references carry their own warning already.
    for target in referenced {
        let target_tag = collector.fetch_symbol_metadata(target).release_tag;
        if target_tag == ReleaseTag::None || own_tag == ReleaseTag::None {
            continue;
        }
        if target_tag < own_tag {
            let target_name = collector.graph.symbol(target).local_name.clone();
            let (file, line, col) = collector.program.location(node);
            collector.messages.push(
                ExtractorMessage::new(
                    MessageId::TypeLeak,
                    format!(
                        "\"{}\" is marked as {} but references \"{}\", which is marked as {}",
                        name,
                        own_tag.tag_name().unwrap_or("(none)"),
                        target_name,
                        target_tag.tag_name().unwrap_or("(none)")
                    ),
                    file,
                    line,
                    col,
                )
                .with_declaration(name.clone()),
            );
        }
    }

    let meta = collector.fetch_declaration_metadata(decl_id);
    if (meta.is_override || meta.is_virtual) && !is_overridable_member(kind) {
        let (file, line, col) = collector.program.location(node);
        let (id, tag) = if meta.is_override {
            (MessageId::InvalidOverride, "@override")
        } else {
            (MessageId::InvalidVirtual, "@virtual")
        };
        collector.messages.push(
            ExtractorMessage::new(
                id,
                format!("The {} tag is not supported on this kind of declaration", tag),
                file,
                line,
                col,
            )
            .with_declaration(name),
        );
    }

    for child in children {
        check_declaration_tree(collector, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer;
    use std::fs;
    use tempfile::TempDir;

    fn collect(source: &str) -> (TempDir, Program) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.ts"), source).unwrap();
        let (program, _) = Program::load(&temp.path().join("index.ts")).unwrap();
        (temp, program)
    }

    fn entity_symbol(collector: &Collector, name: &str) -> AstSymbolId {
        collector
            .entities()
            .iter()
            .find(|e| e.name_for_emit == name)
            .map(|e| e.symbol)
            .unwrap_or_else(|| panic!("no entity named {}", name))
    }

    #[test]
    fn test_release_tag_ordering() {
        assert!(ReleaseTag::Public > ReleaseTag::Beta);
        assert!(ReleaseTag::Beta > ReleaseTag::Alpha);
        assert!(ReleaseTag::Alpha > ReleaseTag::Internal);
        assert!(ReleaseTag::Internal > ReleaseTag::None);
    }

    #[test]
    fn test_effective_tag_from_single_declaration() {
        let (_t, program) = collect("/** Widget. @beta */\nexport class Widget {}\n");
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        let symbol = entity_symbol(&collector, "Widget");
        assert_eq!(
            collector.fetch_symbol_metadata(symbol).release_tag,
            ReleaseTag::Beta
        );
    }

    #[test]
    fn test_members_inherit_parent_tag() {
        let (_t, program) = collect(
            "/** Widget. @public */\nexport class Widget {\n  /** Renders. */\n  render(): void;\n}\n",
        );
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        let widget = entity_symbol(&collector, "Widget");
        let widget_decl = collector.graph.symbol(widget).declarations[0];
        let member_decl = collector.graph.declaration(widget_decl).children[0];
        let member_symbol = collector.graph.declaration(member_decl).symbol;

        let meta = collector.fetch_symbol_metadata(member_symbol);
        assert_eq!(meta.release_tag, ReleaseTag::Public);
        assert!(meta.release_tag_same_as_parent);
    }

    #[test]
    fn test_inconsistent_tags_fall_back_to_public() {
        let (_t, program) = collect(
            "/** @alpha */\nexport interface I { a: string; }\n/** @beta */\nexport interface I { b: number; }\n",
        );
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        let symbol = entity_symbol(&collector, "I");
        assert_eq!(
            collector.fetch_symbol_metadata(symbol).release_tag,
            ReleaseTag::Public
        );
        assert!(collector
            .messages
            .messages()
            .iter()
            .any(|m| m.id == MessageId::InconsistentReleaseTags));
    }

    #[test]
    fn test_missing_release_tag_warning() {
        let (_t, program) = collect("export class Untagged {}\n");
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        check_semantics(&mut collector, &[]);
        assert!(collector
            .messages
            .messages()
            .iter()
            .any(|m| m.id == MessageId::MissingReleaseTag));
    }

    #[test]
    fn test_type_leak_detected() {
        let (_t, program) = collect(concat!(
            "/** @alpha */\nexport interface IOptions { x: number; }\n",
            "/** @public */\nexport declare function configure(options: IOptions): void;\n",
        ));
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        check_semantics(&mut collector, &[]);
        assert!(collector
            .messages
            .messages()
            .iter()
            .any(|m| m.id == MessageId::TypeLeak));
    }

    #[test]
    fn test_no_leak_when_reference_is_more_public() {
        let (_t, program) = collect(concat!(
            "/** @public */\nexport interface IOptions { x: number; }\n",
            "/** @beta */\nexport declare function configure(options: IOptions): void;\n",
        ));
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        check_semantics(&mut collector, &[]);
        assert!(!collector
            .messages
            .messages()
            .iter()
            .any(|m| m.id == MessageId::TypeLeak));
    }

    #[test]
    fn test_invalid_virtual_on_function() {
        let (_t, program) =
            collect("/** Fn. @public @virtual */\nexport declare function f(): void;\n");
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        check_semantics(&mut collector, &[]);
        assert!(collector
            .messages
            .messages()
            .iter()
            .any(|m| m.id == MessageId::InvalidVirtual));
    }

    #[test]
    fn test_constructor_is_undocumented_by_policy() {
        let (_t, program) = collect(
            "/** Widget. @public */\nexport class Widget {\n  constructor(size: number) {}\n}\n",
        );
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        let widget = entity_symbol(&collector, "Widget");
        let widget_decl = collector.graph.symbol(widget).declarations[0];
        let ctor_decl = collector.graph.declaration(widget_decl).children[0];
        let meta = collector.fetch_declaration_metadata(ctor_decl);
        assert!(!meta.needs_documentation);
    }

    #[test]
    fn test_forgotten_export_warning() {
        let (_t, program) = collect(
            "interface IHidden { x: number; }\n/** C. @public */\nexport class C {\n  method(): IHidden;\n}\n",
        );
        let mut collector = Collector::new(&program, analyzer::analyze(&program));
        check_semantics(&mut collector, &[]);
        assert!(collector
            .messages
            .messages()
            .iter()
            .any(|m| m.id == MessageId::ForgottenExport));
    }
}
