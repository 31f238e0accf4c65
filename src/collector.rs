//! The collector: owns the entities that make up the emitted API surface.
//!
//! One entity exists per unique symbol that appears in the surface, whether
//! exported from the entry point or merely reachable through references.
//! The collector assigns each entity its globally unique emit name and
//! memoizes metadata computed by the metadata pass.

use std::collections::HashMap;
use std::rc::Rc;

use crate::aedoc::{self, DocComment};
use crate::analyzer::AnalyzerResult;
use crate::facade::{FileId, Program, Resolution, SymbolKey};
use crate::graph::{AstDeclarationId, AstGraph, AstSymbolId, SymbolIdentity};
use crate::messages::MessageCollector;
use crate::metadata::{self, DeclarationMetadata, SymbolMetadata};

/// One uniquely named element of the emitted API surface.
#[derive(Debug, Clone)]
pub struct CollectorEntity {
    pub symbol: AstSymbolId,
    pub exported: bool,
    /// Unique across all entities; collisions resolved with `_2`, `_3`, …
    pub name_for_emit: String,
}

/// Owns the entity list, the analyzed graph, and memoized metadata.
pub struct Collector<'a> {
    pub program: &'a Program,
    pub graph: AstGraph,
    entities: Vec<CollectorEntity>,
    by_symbol: HashMap<AstSymbolId, usize>,
    decl_metadata: Vec<Option<Rc<DeclarationMetadata>>>,
    symbol_metadata: Vec<Option<Rc<SymbolMetadata>>>,
    pub messages: MessageCollector,
    /// The entry module's `@packageDocumentation` comment, parsed.
    pub package_doc: Option<DocComment>,
}

impl<'a> Collector<'a> {
    /// Admit entities from an analysis result: entry exports first, in
    /// entry-module declaration order, then root symbols reached only
    /// through references, in discovery order.
    pub fn new(program: &'a Program, analyzed: AnalyzerResult) -> Self {
        let AnalyzerResult {
            graph,
            entry_exports,
            discovery_order,
            messages,
        } = analyzed;

        let symbol_count = graph.symbols().count();
        let decl_count = graph.declaration_count();

        let mut collector = Self {
            program,
            graph,
            entities: Vec::new(),
            by_symbol: HashMap::new(),
            decl_metadata: vec![None; decl_count],
            symbol_metadata: vec![None; symbol_count],
            messages,
            package_doc: program.package_doc().map(|raw| aedoc::parse(&raw)),
        };

        for (export_name, symbol) in &entry_exports {
            // `export default` entities keep their local declaration name.
            let desired = if export_name == "default" {
                collector.graph.symbol(*symbol).local_name.clone()
            } else {
                export_name.clone()
            };
            collector.admit(*symbol, true, desired);
        }
        for symbol in discovery_order {
            if collector.graph.symbol(symbol).is_root() {
                let desired = collector.graph.symbol(symbol).local_name.clone();
                collector.admit(symbol, false, desired);
            }
        }
        collector.assign_emit_names();
        collector
    }

    fn admit(&mut self, symbol: AstSymbolId, exported: bool, desired_name: String) {
        if self.by_symbol.contains_key(&symbol) {
            return;
        }
        self.by_symbol.insert(symbol, self.entities.len());
        self.entities.push(CollectorEntity {
            symbol,
            exported,
            name_for_emit: desired_name,
        });
    }

    /// Resolve name collisions in admission order: the first entity keeps
    /// its desired name, later ones get `_2`, `_3`, …
    fn assign_emit_names(&mut self) {
        let mut used: std::collections::HashSet<String> = std::collections::HashSet::new();
        for entity in &mut self.entities {
            if used.insert(entity.name_for_emit.clone()) {
                continue;
            }
            let mut counter = 2;
            loop {
                let candidate = format!("{}_{}", entity.name_for_emit, counter);
                if used.insert(candidate.clone()) {
                    entity.name_for_emit = candidate;
                    break;
                }
                counter += 1;
            }
        }
    }

    /// Entities in admission order.
    pub fn entities(&self) -> &[CollectorEntity] {
        &self.entities
    }

    pub fn try_get_entity_by_symbol(&self, symbol: AstSymbolId) -> Option<&CollectorEntity> {
        self.by_symbol.get(&symbol).map(|&i| &self.entities[i])
    }

    /// The entity a type name resolves to in the given module, if any.
    pub fn entity_for_type_name(&self, file: FileId, name: &str) -> Option<&CollectorEntity> {
        match self.program.resolve_type_name(file, name) {
            Resolution::Symbol { key, .. } => self.entity_for_key(&key),
            _ => None,
        }
    }

    fn entity_for_key(&self, key: &SymbolKey) -> Option<&CollectorEntity> {
        let symbol = self.graph.lookup_symbol(&SymbolIdentity::Root(key.clone()))?;
        self.try_get_entity_by_symbol(symbol)
    }

    /// Memoized declaration metadata. A second fetch returns the same
    /// object.
    pub fn fetch_declaration_metadata(&mut self, decl: AstDeclarationId) -> Rc<DeclarationMetadata> {
        if let Some(existing) = &self.decl_metadata[decl.0] {
            return Rc::clone(existing);
        }
        let computed = Rc::new(metadata::compute_declaration_metadata(
            self.program,
            &self.graph,
            decl,
        ));
        self.decl_metadata[decl.0] = Some(Rc::clone(&computed));
        computed
    }

    /// Memoized symbol metadata, resolving release tags with inheritance.
    pub fn fetch_symbol_metadata(&mut self, symbol: AstSymbolId) -> Rc<SymbolMetadata> {
        if let Some(existing) = &self.symbol_metadata[symbol.0] {
            return Rc::clone(existing);
        }
        let computed = Rc::new(metadata::compute_symbol_metadata(self, symbol));
        self.symbol_metadata[symbol.0] = Some(Rc::clone(&computed));
        computed
    }

    /// Sort key that strips a single leading underscore, so `_foo` sorts
    /// next to `foo` but after it on ties.
    pub fn get_sort_key_ignoring_underscore(name: &str) -> String {
        match name.strip_prefix('_') {
            Some(stripped) => format!("{} 1", stripped),
            None => format!("{} 0", name),
        }
    }
}
