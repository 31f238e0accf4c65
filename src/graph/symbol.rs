//! Graph node for a logical named entity.

use crate::facade::SymbolKey;

/// Handle to an [`AstSymbol`] in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AstSymbolId(pub usize);

/// Handle to an [`crate::graph::AstDeclaration`] in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AstDeclarationId(pub usize);

/// Identity under which symbols are deduplicated.
///
/// Alias following happens before a symbol is created, so the same terminal
/// symbol always maps to the same graph node regardless of how many import
/// paths reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolIdentity {
    /// A module-level symbol, keyed by its terminal resolution.
    Root(SymbolKey),
    /// A member of another symbol (method, property, nested declaration).
    Member { parent: AstSymbolId, name: String },
}

/// One logical named entity in the analyzed program.
///
/// Created during analysis, frozen once the graph is marked analyzed, and
/// read-only afterwards.
#[derive(Debug)]
pub struct AstSymbol {
    /// The name at the defining site, after alias following.
    pub local_name: String,
    pub identity: SymbolIdentity,
    /// External/ambient: referenced by name only, never emitted
    /// structurally.
    pub nominal: bool,
    /// Whether an import binding was crossed to reach the symbol.
    pub imported: bool,
    /// Declaration sites, in source order.
    pub declarations: Vec<AstDeclarationId>,
    pub(crate) analyzed: bool,
}

impl AstSymbol {
    pub fn is_root(&self) -> bool {
        matches!(self.identity, SymbolIdentity::Root(_))
    }

    pub fn analyzed(&self) -> bool {
        self.analyzed
    }
}
