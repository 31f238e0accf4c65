//! Surfacer - API surface extraction for TypeScript packages.
//!
//! Surfacer walks a package's module graph from its entry point and
//! produces two artifacts:
//!
//! - A **review file**: a canonical, human-reviewable snapshot of every
//!   exported declaration, stable across semantically equivalent edits.
//! - An **API model**: a JSON tree of documented items for downstream
//!   documentation generators.
//!
//! # Architecture
//!
//! The pipeline is a single synchronous pass:
//!
//! - `facade`: read-only adapter over the tree-sitter TypeScript parser;
//!   module loading, symbol tables, alias following
//! - `graph`: arena-allocated AstSymbol/AstDeclaration graph
//! - `analyzer`: traversal from entry exports, reference discovery,
//!   forgotten-export detection
//! - `collector`: entity admission, emit-name collision resolution,
//!   memoized metadata
//! - `aedoc` + `metadata`: doc-comment parsing, release tags, semantic
//!   checks
//! - `span`: whitespace-preserving rewriter over source text
//! - `review` + `model`: the two artifact generators
//! - `messages`: diagnostics collected across all stages

pub mod aedoc;
pub mod analyzer;
pub mod cli;
pub mod collector;
pub mod config;
pub mod extractor;
pub mod facade;
pub mod graph;
pub mod messages;
pub mod metadata;
pub mod model;
pub mod review;
pub mod span;

pub use collector::{Collector, CollectorEntity};
pub use config::ExtractorConfig;
pub use extractor::{ExtractionResult, Extractor};
pub use facade::{Program, SourceFile};
pub use graph::{AstDeclaration, AstGraph, AstSymbol};
pub use messages::{ExtractorMessage, MessageId, Severity};
pub use metadata::ReleaseTag;
pub use model::{ApiDocument, ApiItem, ApiItemKind};
pub use review::are_equivalent_api_file_contents;
pub use span::Span;

/// Initialize all subsystems.
///
/// Call this once at startup. The recognized doc-tag table is built here
/// and shared read-only afterwards.
pub fn init() {
    aedoc::init();
}
