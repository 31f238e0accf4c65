//! The analyzed declaration graph.
//!
//! Symbols and declarations live in arenas and point at each other through
//! integer handles, so the inherent cycles (a method's parent is its class,
//! the class references its members' types) never need shared ownership.
//!
//! Construction-time invariants are enforced here: no mutation after the
//! graph is marked analyzed, child attachment checks parent identity, and
//! reference edges reject self/ancestor targets and duplicate identities.
//! Violations are program bugs and panic.

mod declaration;
mod symbol;

pub use declaration::{
    declaration_name, is_constructor, is_declaration_kind, is_declaration_node, is_enum_member,
    is_function_like, is_namespace_kind, is_overridable_member, AstDeclaration,
};
pub use symbol::{AstDeclarationId, AstSymbol, AstSymbolId, SymbolIdentity};

use std::collections::HashMap;

use crate::facade::{NodeKey, Program};

/// Arena owning every [`AstSymbol`] and [`AstDeclaration`].
#[derive(Debug, Default)]
pub struct AstGraph {
    symbols: Vec<AstSymbol>,
    declarations: Vec<AstDeclaration>,
    by_identity: HashMap<SymbolIdentity, AstSymbolId>,
    by_node: HashMap<NodeKey, AstDeclarationId>,
    analyzed: bool,
}

impl AstGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn symbol(&self, id: AstSymbolId) -> &AstSymbol {
        &self.symbols[id.0]
    }

    pub fn declaration(&self, id: AstDeclarationId) -> &AstDeclaration {
        &self.declarations[id.0]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (AstSymbolId, &AstSymbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (AstSymbolId(i), s))
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn lookup_symbol(&self, identity: &SymbolIdentity) -> Option<AstSymbolId> {
        self.by_identity.get(identity).copied()
    }

    /// The declaration constructed for a syntax node, if any.
    pub fn declaration_for_node(&self, node: NodeKey) -> Option<AstDeclarationId> {
        self.by_node.get(&node).copied()
    }

    /// Create a symbol, or return the existing one for the same identity.
    pub fn ensure_symbol(
        &mut self,
        identity: SymbolIdentity,
        local_name: String,
        nominal: bool,
        imported: bool,
    ) -> (AstSymbolId, bool) {
        if let Some(&id) = self.by_identity.get(&identity) {
            return (id, false);
        }
        assert!(
            !self.analyzed,
            "program bug: symbol \"{}\" added after analysis",
            local_name
        );
        let id = AstSymbolId(self.symbols.len());
        self.symbols.push(AstSymbol {
            local_name,
            identity: identity.clone(),
            nominal,
            imported,
            declarations: Vec::new(),
            analyzed: false,
        });
        self.by_identity.insert(identity, id);
        (id, true)
    }

    /// Create a declaration site and link it into the graph.
    ///
    /// Member symbols must be attached under the declaration of their
    /// parent symbol; mismatches are program bugs.
    pub fn add_declaration(
        &mut self,
        node: NodeKey,
        symbol: AstSymbolId,
        parent: Option<AstDeclarationId>,
    ) -> AstDeclarationId {
        assert!(!self.analyzed, "program bug: declaration added after analysis");

        match (&self.symbols[symbol.0].identity, parent) {
            (SymbolIdentity::Member { parent: psym, .. }, Some(pdecl)) => {
                assert_eq!(
                    *psym, self.declarations[pdecl.0].symbol,
                    "program bug: member declaration attached under a foreign parent"
                );
            }
            (SymbolIdentity::Member { .. }, None) => {
                panic!("program bug: member declaration attached at the root");
            }
            (SymbolIdentity::Root(_), Some(_)) => {
                panic!("program bug: root declaration attached under a parent");
            }
            (SymbolIdentity::Root(_), None) => {}
        }

        let id = AstDeclarationId(self.declarations.len());
        self.declarations.push(AstDeclaration {
            node,
            symbol,
            parent,
            children: Vec::new(),
            referenced: Vec::new(),
        });
        self.symbols[symbol.0].declarations.push(id);
        if let Some(parent) = parent {
            self.declarations[parent.0].children.push(id);
        }
        self.by_node.insert(node, id);
        id
    }

    /// Record a reference edge. Self and ancestor targets are rejected;
    /// duplicates are deduplicated by identity. Returns whether the edge
    /// was recorded.
    pub fn add_reference(&mut self, decl: AstDeclarationId, target: AstSymbolId) -> bool {
        assert!(!self.analyzed, "program bug: reference added after analysis");
        if self.is_ancestor_or_self_symbol(decl, target) {
            return false;
        }
        let referenced = &mut self.declarations[decl.0].referenced;
        if referenced.contains(&target) {
            return false;
        }
        referenced.push(target);
        true
    }

    /// Whether `target` is the symbol of `decl` or of any ancestor.
    pub fn is_ancestor_or_self_symbol(&self, decl: AstDeclarationId, target: AstSymbolId) -> bool {
        let mut current = Some(decl);
        while let Some(id) = current {
            let d = &self.declarations[id.0];
            if d.symbol == target {
                return true;
            }
            current = d.parent;
        }
        false
    }

    /// Whether any strict ancestor of `decl` already records `target`.
    pub fn ancestry_records(&self, decl: AstDeclarationId, target: AstSymbolId) -> bool {
        let mut current = self.declarations[decl.0].parent;
        while let Some(id) = current {
            let d = &self.declarations[id.0];
            if d.referenced.contains(&target) {
                return true;
            }
            current = d.parent;
        }
        false
    }

    /// The symbol of the nearest enclosing declaration, if any.
    pub fn parent_symbol(&self, symbol: AstSymbolId) -> Option<AstSymbolId> {
        let first_decl = *self.symbols[symbol.0].declarations.first()?;
        let parent_decl = self.declarations[first_decl.0].parent?;
        Some(self.declarations[parent_decl.0].symbol)
    }

    /// Freeze the graph. Every symbol becomes analyzed and read-only.
    pub fn mark_analyzed(&mut self) {
        self.analyzed = true;
        for symbol in &mut self.symbols {
            symbol.analyzed = true;
        }
    }

    /// Visit a declaration and all nested declarations, depth first.
    pub fn for_each_declaration_recursive<F>(&self, decl: AstDeclarationId, f: &mut F)
    where
        F: FnMut(AstDeclarationId, &AstDeclaration),
    {
        let d = &self.declarations[decl.0];
        f(decl, d);
        for &child in &d.children {
            self.for_each_declaration_recursive(child, f);
        }
    }

    /// Deterministic textual dump of the graph, for diagnostics.
    pub fn dump(&self, program: &Program) -> String {
        let mut out = String::new();
        for (_, symbol) in self.symbols().filter(|(_, s)| s.is_root()) {
            out.push_str(&format!(
                "AstSymbol: {}{}{}\n",
                symbol.local_name,
                if symbol.nominal { " [nominal]" } else { "" },
                if symbol.imported { " [imported]" } else { "" },
            ));
            for &decl in &symbol.declarations {
                self.dump_declaration(program, decl, 1, &mut out);
            }
        }
        out
    }

    fn dump_declaration(
        &self,
        program: &Program,
        decl: AstDeclarationId,
        depth: usize,
        out: &mut String,
    ) {
        let d = &self.declarations[decl.0];
        let indent = "  ".repeat(depth);
        let (file, line, col) = program.location(d.node);
        out.push_str(&format!(
            "{}AstDeclaration: {} {} ({}:{}:{})\n",
            indent,
            d.node.kind,
            self.symbols[d.symbol.0].local_name,
            file,
            line,
            col
        ));
        if !d.referenced.is_empty() {
            let names: Vec<&str> = d
                .referenced
                .iter()
                .map(|&s| self.symbols[s.0].local_name.as_str())
                .collect();
            out.push_str(&format!("{}  referenced: {}\n", indent, names.join(", ")));
        }
        for &child in &d.children {
            self.dump_declaration(program, child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::{FileId, SymbolKey};

    fn node_key(start: usize, end: usize) -> NodeKey {
        NodeKey {
            file: FileId(0),
            start,
            end,
            kind: "class_declaration",
        }
    }

    fn root_symbol(graph: &mut AstGraph, name: &str) -> AstSymbolId {
        let (id, _) = graph.ensure_symbol(
            SymbolIdentity::Root(SymbolKey::Local {
                file: FileId(0),
                name: name.to_string(),
            }),
            name.to_string(),
            false,
            false,
        );
        id
    }

    #[test]
    fn test_symbol_identity_dedupes() {
        let mut graph = AstGraph::new();
        let a = root_symbol(&mut graph, "Widget");
        let b = root_symbol(&mut graph, "Widget");
        assert_eq!(a, b);
    }

    #[test]
    fn test_reference_rejects_self_and_ancestor() {
        let mut graph = AstGraph::new();
        let class_sym = root_symbol(&mut graph, "Widget");
        let class_decl = graph.add_declaration(node_key(0, 100), class_sym, None);

        let (member_sym, _) = graph.ensure_symbol(
            SymbolIdentity::Member {
                parent: class_sym,
                name: "render".to_string(),
            },
            "render".to_string(),
            false,
            false,
        );
        let member_decl = graph.add_declaration(node_key(10, 40), member_sym, Some(class_decl));

        // A method referencing its own class is not an edge.
        assert!(!graph.add_reference(member_decl, class_sym));
        assert!(!graph.add_reference(member_decl, member_sym));

        let other = root_symbol(&mut graph, "Other");
        assert!(graph.add_reference(member_decl, other));
        // Identity dedup.
        assert!(!graph.add_reference(member_decl, other));
        assert_eq!(graph.declaration(member_decl).referenced, vec![other]);
    }

    #[test]
    #[should_panic(expected = "program bug")]
    fn test_no_mutation_after_analyzed() {
        let mut graph = AstGraph::new();
        let sym = root_symbol(&mut graph, "Widget");
        graph.add_declaration(node_key(0, 10), sym, None);
        graph.mark_analyzed();
        let _ = root_symbol(&mut graph, "Late");
    }

    #[test]
    #[should_panic(expected = "foreign parent")]
    fn test_member_under_foreign_parent_panics() {
        let mut graph = AstGraph::new();
        let a = root_symbol(&mut graph, "A");
        let b = root_symbol(&mut graph, "B");
        let a_decl = graph.add_declaration(node_key(0, 50), a, None);
        let _b_decl = graph.add_declaration(node_key(60, 90), b, None);

        let (member, _) = graph.ensure_symbol(
            SymbolIdentity::Member {
                parent: b,
                name: "x".to_string(),
            },
            "x".to_string(),
            false,
            false,
        );
        // Member of B attached under A's declaration.
        graph.add_declaration(node_key(5, 20), member, Some(a_decl));
    }

    #[test]
    fn test_parent_symbol() {
        let mut graph = AstGraph::new();
        let class_sym = root_symbol(&mut graph, "Widget");
        let class_decl = graph.add_declaration(node_key(0, 100), class_sym, None);
        let (member_sym, _) = graph.ensure_symbol(
            SymbolIdentity::Member {
                parent: class_sym,
                name: "render".to_string(),
            },
            "render".to_string(),
            false,
            false,
        );
        graph.add_declaration(node_key(10, 40), member_sym, Some(class_decl));

        assert_eq!(graph.parent_symbol(member_sym), Some(class_sym));
        assert_eq!(graph.parent_symbol(class_sym), None);
    }
}
