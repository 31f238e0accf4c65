//! Symbol analysis: from entry exports to the declaration graph.
//!
//! The analyzer walks each entry export to its terminal symbol, constructs
//! declaration sites with their nested members, and discovers referenced
//! symbols in type positions. Anything declared locally but reachable only
//! through references stays in the graph as a forgotten export for the
//! collector to admit later.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::facade::{
    is_reference_position, FileId, NodeKey, Program, Resolution, SourceFile, SymbolKey,
};
use crate::graph::{
    declaration_name, is_declaration_node, is_namespace_kind, AstDeclarationId, AstGraph,
    AstSymbolId, SymbolIdentity,
};
use crate::messages::{ExtractorMessage, MessageCollector, MessageId};

/// Candidate harvester for reference positions; the real filtering happens
/// in [`is_reference_position`].
const REFERENCE_QUERY: &str = r#"
(type_identifier) @reference
(identifier) @reference
"#;

/// Output of the analysis stage.
pub struct AnalyzerResult {
    pub graph: AstGraph,
    /// Entry exports in entry-module declaration order.
    pub entry_exports: Vec<(String, AstSymbolId)>,
    /// Root symbols in first-discovery order (depth first).
    pub discovery_order: Vec<AstSymbolId>,
    pub messages: MessageCollector,
}

/// Analyze the program from its entry exports.
pub fn analyze(program: &Program) -> AnalyzerResult {
    let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    let query = Query::new(&language, REFERENCE_QUERY).expect("reference query must compile");

    let mut analyzer = SymbolAnalyzer {
        program,
        graph: AstGraph::new(),
        discovery_order: Vec::new(),
        messages: MessageCollector::new(),
        query,
    };

    let mut entry_exports = Vec::new();
    for (export_name, resolution) in program.entry_exports() {
        match resolution {
            Resolution::Symbol { key, crossed_import } => {
                let id = analyzer.fetch_symbol(&key, &export_name, crossed_import);
                entry_exports.push((export_name, id));
            }
            Resolution::Broken(reason) => {
                let entry = program.file(program.entry());
                analyzer.messages.push(ExtractorMessage::new(
                    MessageId::UnresolvedReference,
                    format!("Entry export \"{}\" could not be resolved: {}", export_name, reason),
                    entry.rel_path.clone(),
                    1,
                    1,
                ));
            }
            Resolution::Ambient => {
                let entry = program.file(program.entry());
                analyzer.messages.push(ExtractorMessage::new(
                    MessageId::UnresolvedReference,
                    format!(
                        "Entry export \"{}\" does not refer to a declaration in this package",
                        export_name
                    ),
                    entry.rel_path.clone(),
                    1,
                    1,
                ));
            }
        }
    }

    analyzer.graph.mark_analyzed();

    AnalyzerResult {
        graph: analyzer.graph,
        entry_exports,
        discovery_order: analyzer.discovery_order,
        messages: analyzer.messages,
    }
}

struct SymbolAnalyzer<'a> {
    program: &'a Program,
    graph: AstGraph,
    discovery_order: Vec<AstSymbolId>,
    messages: MessageCollector,
    query: Query,
}

impl<'a> SymbolAnalyzer<'a> {
    /// Ensure an [`crate::graph::AstSymbol`] for a terminal symbol,
    /// materialising its declarations, members, and references on first
    /// sight.
    fn fetch_symbol(&mut self, key: &SymbolKey, local_name_hint: &str, crossed_import: bool) -> AstSymbolId {
        let identity = SymbolIdentity::Root(key.clone());
        if let Some(id) = self.graph.lookup_symbol(&identity) {
            return id;
        }

        let nominal = key.is_external();
        let local_name = match key {
            SymbolKey::Local { name, .. } => name.clone(),
            SymbolKey::External { .. } => local_name_hint.to_string(),
        };
        let (id, _) = self
            .graph
            .ensure_symbol(identity, local_name, nominal, crossed_import || nominal);
        self.discovery_order.push(id);

        let mut root_decls = Vec::new();
        for decl_key in self.program.declarations_of(key) {
            let decl_id = self.graph.add_declaration(decl_key, id, None);
            let file = self.program.file(decl_key.file);
            let node = file.node_at(decl_key);
            self.build_members(file, decl_key.file, node, decl_id);
            root_decls.push(decl_id);
        }

        // References are collected after the member tree exists so that each
        // edge lands on the innermost enclosing declaration.
        for decl_id in root_decls {
            self.collect_references(decl_id);
        }
        id
    }

    /// Construct child declarations for every nested eligible node,
    /// skipping non-qualifying intermediates and function bodies.
    fn build_members(
        &mut self,
        file: &SourceFile,
        fid: FileId,
        node: Node,
        decl_id: AstDeclarationId,
    ) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            if child.kind() == "statement_block" && !is_namespace_kind(node.kind()) {
                // Implementation detail; nothing declared inside is API.
                continue;
            }
            if is_declaration_node(child) {
                let name = declaration_name(file, child);
                let parent_symbol = self.graph.declaration(decl_id).symbol;
                let (member_symbol, _) = self.graph.ensure_symbol(
                    SymbolIdentity::Member {
                        parent: parent_symbol,
                        name: name.clone(),
                    },
                    name,
                    false,
                    false,
                );
                let member_decl =
                    self.graph
                        .add_declaration(NodeKey::of(fid, child), member_symbol, Some(decl_id));
                self.build_members(file, fid, child, member_decl);
            } else {
                self.build_members(file, fid, child, decl_id);
            }
        }
    }

    /// Find referenced symbols in type positions within one root
    /// declaration's subtree.
    fn collect_references(&mut self, root_decl: AstDeclarationId) {
        let decl_node_key = self.graph.declaration(root_decl).node;
        let fid = decl_node_key.file;
        let file = self.program.file(fid);
        let root_node = file.node_at(decl_node_key);

        let mut targets: Vec<(NodeKey, String, AstDeclarationId)> = Vec::new();
        {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(&self.query, root_node, file.text.as_bytes());
            while let Some(m) = matches.next() {
                for capture in m.captures {
                    let node = capture.node;
                    if !is_reference_position(node) {
                        continue;
                    }
                    if in_function_body(node, root_node) {
                        continue;
                    }
                    let decl = self.innermost_declaration(fid, node, root_node, root_decl);
                    targets.push((NodeKey::of(fid, node), file.node_text(node).to_string(), decl));
                }
            }
        }

        for (site, name, decl) in targets {
            self.record_reference(fid, site, &name, decl);
        }
    }

    /// The innermost constructed declaration enclosing a node.
    fn innermost_declaration(
        &self,
        fid: FileId,
        node: Node,
        root_node: Node,
        root_decl: AstDeclarationId,
    ) -> AstDeclarationId {
        let mut current = node.parent();
        while let Some(n) = current {
            if let Some(decl) = self.graph.declaration_for_node(NodeKey::of(fid, n)) {
                return decl;
            }
            if n.id() == root_node.id() {
                break;
            }
            current = n.parent();
        }
        root_decl
    }

    fn record_reference(
        &mut self,
        fid: FileId,
        site: NodeKey,
        name: &str,
        decl: AstDeclarationId,
    ) {
        match self.program.resolve_type_name(fid, name) {
            Resolution::Ambient => {}
            Resolution::Broken(reason) => {
                let (file, line, col) = self.program.location(site);
                let declaration_name = self
                    .graph
                    .symbol(self.graph.declaration(decl).symbol)
                    .local_name
                    .clone();
                self.messages.push(
                    ExtractorMessage::new(
                        MessageId::UnresolvedReference,
                        format!("Reference to \"{}\" was dropped: {}", name, reason),
                        file,
                        line,
                        col,
                    )
                    .with_declaration(declaration_name),
                );
            }
            Resolution::Symbol { key, crossed_import } => {
                let target = self.fetch_symbol(&key, name, crossed_import);
                if self.graph.is_ancestor_or_self_symbol(decl, target) {
                    return;
                }
                if self.graph.ancestry_records(decl, target) {
                    return;
                }
                self.graph.add_reference(decl, target);
            }
        }
    }
}

/// Whether a node sits inside a function body (namespace bodies share the
/// same block kind but stay eligible).
fn in_function_body(node: Node, top: Node) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.id() == top.id() {
            return false;
        }
        if n.kind() == "statement_block" {
            let namespace_body = n
                .parent()
                .map(|p| is_namespace_kind(p.kind()))
                .unwrap_or(false);
            if !namespace_body {
                return true;
            }
        }
        current = n.parent();
    }
    false
}
