//! Read-only adapter over the host TypeScript parser.
//!
//! The rest of the crate never touches tree-sitter state directly: it goes
//! through [`Program`] for loading, symbol resolution, and node lookup, and
//! through [`SourceFile`] for text access. Trees and text buffers are owned
//! here; spans and declarations borrow from them and must not outlive the
//! program.

mod parsing;
mod symbols;

pub use parsing::{FileId, NodeKey, SourceFile};
pub use symbols::{
    is_reference_position, ExportEntry, ExportTarget, ImportBinding, ImportedName, ModuleRef,
    ModuleTable, Program, Resolution, SymbolKey,
};

use std::path::PathBuf;
use thiserror::Error;

/// Structured input errors from the façade.
///
/// These abort processing of the package; semantic findings are collected
/// as messages instead.
#[derive(Error, Debug)]
pub enum FacadeError {
    #[error("cannot access entry point {path}: {reason}")]
    EntryPoint { path: PathBuf, reason: String },
    #[error("failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}
