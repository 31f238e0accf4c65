//! Module-level symbol oracle.
//!
//! A [`Program`] loads the entry module and everything reachable through
//! relative imports, then answers the symbol queries the analyzer needs:
//! which names a module declares, what an identifier resolves to after
//! following import/re-export alias chains, and what the entry point
//! exports. Non-relative imports are external packages; their symbols are
//! nominal and carry no declarations.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use tree_sitter::Node;

use super::parsing::{FileId, NodeKey, SourceFile};
use super::FacadeError;
use crate::messages::{ExtractorMessage, MessageCollector, MessageId};

/// What a named import binds to in its source module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

/// One import binding: `local name -> (specifier, imported name)`.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub specifier: String,
    pub imported: ImportedName,
}

/// Where an export entry points.
#[derive(Debug, Clone)]
pub enum ExportTarget {
    /// `export { name }` or an exported declaration.
    Local(String),
    /// `export { name as alias } from './module'`.
    Reexport { specifier: String, name: String },
}

/// One entry in a module's export list, in order of appearance.
#[derive(Debug, Clone)]
pub enum ExportEntry {
    Named { export_name: String, target: ExportTarget },
    Star { specifier: String },
}

/// Per-module symbol table.
#[derive(Debug, Default)]
pub struct ModuleTable {
    /// Top-level declaration names in first-occurrence order.
    decl_order: Vec<String>,
    /// Declaration sites per name; merged declarations keep source order.
    decls: HashMap<String, Vec<NodeKey>>,
    imports: HashMap<String, ImportBinding>,
    exports: Vec<ExportEntry>,
    export_index: HashMap<String, usize>,
    /// Module specifiers referenced by this module, with the statement that
    /// referenced them (for diagnostics).
    specifiers: Vec<(String, NodeKey)>,
}

impl ModuleTable {
    fn register_decl(&mut self, name: String, key: NodeKey) {
        let sites = self.decls.entry(name.clone()).or_default();
        if sites.is_empty() {
            self.decl_order.push(name);
        }
        sites.push(key);
    }

    fn add_export(&mut self, export_name: String, target: ExportTarget) {
        if self.export_index.contains_key(&export_name) {
            return;
        }
        self.export_index
            .insert(export_name.clone(), self.exports.len());
        self.exports.push(ExportEntry::Named {
            export_name,
            target,
        });
    }
}

/// Resolution of a module specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRef {
    File(FileId),
    External,
    Missing,
}

/// Identity of a logical symbol after alias following.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKey {
    /// Declared in a loaded project file.
    Local { file: FileId, name: String },
    /// Declared by an external package; nominal, referenced by name only.
    External { package: String, name: String },
}

impl SymbolKey {
    pub fn is_external(&self) -> bool {
        matches!(self, SymbolKey::External { .. })
    }
}

/// Outcome of resolving a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The terminal symbol, plus whether any import binding was crossed on
    /// the way there.
    Symbol {
        key: SymbolKey,
        crossed_import: bool,
    },
    /// Not declared and not imported: an ambient global, not tracked.
    Ambient,
    /// An alias chain that cannot be completed. The reference is dropped
    /// and the reason surfaces as a warning.
    Broken(String),
}

/// Syntax kinds that introduce a reference-followable identifier position.
///
/// Covers type references (`type_identifier`), the module part of qualified
/// type names, and class heritage expressions. Value positions are not
/// reference positions.
pub fn is_reference_position(node: Node) -> bool {
    match node.kind() {
        "type_identifier" => {
            let Some(parent) = node.parent() else {
                return false;
            };
            if parent.kind() == "nested_type_identifier" {
                // The right-hand side of `A.B`; only the head resolves.
                return false;
            }
            !is_name_of_parent(node, parent)
        }
        "identifier" => {
            let Some(parent) = node.parent() else {
                return false;
            };
            match parent.kind() {
                "nested_type_identifier" | "nested_identifier" => node.prev_sibling().is_none(),
                "extends_clause" => true,
                "member_expression" => {
                    // `extends A.B.C`: only the head of the chain.
                    let mut current = node;
                    let mut outer = parent;
                    loop {
                        if current.prev_sibling().is_some() {
                            return false;
                        }
                        match outer.kind() {
                            "member_expression" => {
                                current = outer;
                                outer = match outer.parent() {
                                    Some(p) => p,
                                    None => return false,
                                };
                            }
                            "extends_clause" => return true,
                            _ => return false,
                        }
                    }
                }
                _ => false,
            }
        }
        _ => false,
    }
}

fn is_name_of_parent(node: Node, parent: Node) -> bool {
    parent
        .child_by_field_name("name")
        .map(|n| n.id() == node.id())
        .unwrap_or(false)
}

/// Statement-level kinds that declare top-level names.
fn is_declaration_statement(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "abstract_class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "function_declaration"
            | "function_signature"
            | "internal_module"
            | "module"
            | "type_alias_declaration"
            | "lexical_declaration"
            | "variable_declaration"
            | "ambient_declaration"
    )
}

/// The loaded module graph and symbol oracle.
pub struct Program {
    files: Vec<SourceFile>,
    tables: Vec<ModuleTable>,
    resolutions: Vec<HashMap<String, ModuleRef>>,
    entry: FileId,
}

impl Program {
    /// Load the entry module and every project module reachable through
    /// relative imports. Load-time diagnostics (unresolvable modules,
    /// unsupported syntax) are collected, not thrown.
    pub fn load(entry: &Path) -> Result<(Program, MessageCollector), FacadeError> {
        let entry_path = fs::canonicalize(entry).map_err(|e| FacadeError::EntryPoint {
            path: entry.to_path_buf(),
            reason: e.to_string(),
        })?;
        let base_dir = entry_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();

        let mut messages = MessageCollector::new();
        let mut files: Vec<SourceFile> = Vec::new();
        let mut tables: Vec<ModuleTable> = Vec::new();
        let mut path_resolutions: Vec<HashMap<String, Result<PathBuf, ()>>> = Vec::new();
        let mut by_path: HashMap<PathBuf, FileId> = HashMap::new();

        let mut queue = VecDeque::new();
        queue.push_back(entry_path.clone());

        while let Some(path) = queue.pop_front() {
            if by_path.contains_key(&path) {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|e| FacadeError::Io {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            let rel_path = path
                .strip_prefix(&base_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            let fid = FileId(files.len());
            let file = SourceFile::parse(&path, rel_path, text)?;
            let table = build_table(&file, fid, &mut messages);

            let mut resolved = HashMap::new();
            for (specifier, site) in &table.specifiers {
                if resolved.contains_key(specifier) {
                    continue;
                }
                if !is_relative_specifier(specifier) {
                    continue;
                }
                let dir = path.parent().unwrap_or(Path::new(""));
                match resolve_specifier(dir, specifier) {
                    Some(target) => {
                        queue.push_back(target.clone());
                        resolved.insert(specifier.clone(), Ok(target));
                    }
                    None => {
                        let (line, col) = file.line_col(site.start);
                        messages.push(ExtractorMessage::new(
                            MessageId::UnresolvedReference,
                            format!("Module \"{}\" could not be resolved", specifier),
                            file.rel_path.clone(),
                            line,
                            col,
                        ));
                        resolved.insert(specifier.clone(), Err(()));
                    }
                }
            }

            by_path.insert(path, fid);
            files.push(file);
            tables.push(table);
            path_resolutions.push(resolved);
        }

        let resolutions = path_resolutions
            .into_iter()
            .map(|map| {
                map.into_iter()
                    .map(|(spec, target)| {
                        let module_ref = match target {
                            Ok(path) => ModuleRef::File(by_path[&path]),
                            Err(()) => ModuleRef::Missing,
                        };
                        (spec, module_ref)
                    })
                    .collect()
            })
            .collect();

        Ok((
            Program {
                files,
                tables,
                resolutions,
                entry: FileId(0),
            },
            messages,
        ))
    }

    pub fn entry(&self) -> FileId {
        self.entry
    }

    pub fn file(&self, fid: FileId) -> &SourceFile {
        &self.files[fid.0]
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    pub fn node_at(&self, key: NodeKey) -> Node<'_> {
        self.file(key.file).node_at(key)
    }

    /// (relative path, line, column) of a node, for diagnostics.
    pub fn location(&self, key: NodeKey) -> (String, usize, usize) {
        let file = self.file(key.file);
        let (line, col) = file.line_col(key.start);
        (file.rel_path.clone(), line, col)
    }

    fn module_ref(&self, fid: FileId, specifier: &str) -> ModuleRef {
        if !is_relative_specifier(specifier) {
            return ModuleRef::External;
        }
        self.resolutions[fid.0]
            .get(specifier)
            .copied()
            .unwrap_or(ModuleRef::Missing)
    }

    /// Declaration sites of a symbol, in source order. External symbols are
    /// nominal and have none.
    pub fn declarations_of(&self, key: &SymbolKey) -> Vec<NodeKey> {
        match key {
            SymbolKey::Local { file, name } => self.tables[file.0]
                .decls
                .get(name)
                .cloned()
                .unwrap_or_default(),
            SymbolKey::External { .. } => Vec::new(),
        }
    }

    /// Resolve a name used in type position within a module.
    pub fn resolve_type_name(&self, fid: FileId, name: &str) -> Resolution {
        let mut seen = HashSet::new();
        self.resolve_local(fid, name, &mut seen)
    }

    fn resolve_local(
        &self,
        fid: FileId,
        name: &str,
        seen: &mut HashSet<(bool, FileId, String)>,
    ) -> Resolution {
        if !seen.insert((false, fid, name.to_string())) {
            return Resolution::Broken(format!("circular alias chain through \"{}\"", name));
        }

        let table = &self.tables[fid.0];
        if table.decls.contains_key(name) {
            return Resolution::Symbol {
                key: SymbolKey::Local {
                    file: fid,
                    name: name.to_string(),
                },
                crossed_import: false,
            };
        }

        if let Some(binding) = table.imports.get(name) {
            let result = match self.module_ref(fid, &binding.specifier) {
                ModuleRef::External => Resolution::Symbol {
                    key: SymbolKey::External {
                        package: binding.specifier.clone(),
                        name: match &binding.imported {
                            ImportedName::Named(n) => n.clone(),
                            ImportedName::Default => "default".to_string(),
                            ImportedName::Namespace => "*".to_string(),
                        },
                    },
                    crossed_import: true,
                },
                ModuleRef::Missing => Resolution::Broken(format!(
                    "module \"{}\" could not be resolved",
                    binding.specifier
                )),
                ModuleRef::File(target) => match &binding.imported {
                    // Namespace imports are opaque: the binding itself is
                    // the terminal symbol.
                    ImportedName::Namespace => Resolution::Symbol {
                        key: SymbolKey::External {
                            package: binding.specifier.clone(),
                            name: "*".to_string(),
                        },
                        crossed_import: true,
                    },
                    ImportedName::Named(n) => self.resolve_export(target, n, seen),
                    ImportedName::Default => self.resolve_export(target, "default", seen),
                },
            };
            return mark_crossed(result);
        }

        Resolution::Ambient
    }

    fn resolve_export(
        &self,
        fid: FileId,
        name: &str,
        seen: &mut HashSet<(bool, FileId, String)>,
    ) -> Resolution {
        if !seen.insert((true, fid, name.to_string())) {
            return Resolution::Broken(format!("circular re-export chain through \"{}\"", name));
        }

        let table = &self.tables[fid.0];
        if let Some(&idx) = table.export_index.get(name) {
            let ExportEntry::Named { target, .. } = &table.exports[idx] else {
                unreachable!("export index points at a named entry");
            };
            return match target {
                ExportTarget::Local(local) => {
                    let local = local.clone();
                    self.resolve_local(fid, &local, seen)
                }
                ExportTarget::Reexport { specifier, name: n } => {
                    let result = match self.module_ref(fid, specifier) {
                        ModuleRef::File(target) => {
                            let n = n.clone();
                            self.resolve_export(target, &n, seen)
                        }
                        ModuleRef::External => Resolution::Symbol {
                            key: SymbolKey::External {
                                package: specifier.clone(),
                                name: n.clone(),
                            },
                            crossed_import: true,
                        },
                        ModuleRef::Missing => Resolution::Broken(format!(
                            "module \"{}\" could not be resolved",
                            specifier
                        )),
                    };
                    mark_crossed(result)
                }
            };
        }

        // Star re-exports, in order of appearance.
        for entry in &table.exports {
            if let ExportEntry::Star { specifier } = entry {
                if let ModuleRef::File(target) = self.module_ref(fid, specifier) {
                    let mut branch = seen.clone();
                    if let Resolution::Symbol { key, .. } =
                        self.resolve_export(target, name, &mut branch)
                    {
                        return Resolution::Symbol {
                            key,
                            crossed_import: true,
                        };
                    }
                }
            }
        }

        Resolution::Broken(format!("no exported member \"{}\"", name))
    }

    /// The entry module's exports, in declaration order, with star exports
    /// expanded at their position.
    pub fn entry_exports(&self) -> Vec<(String, Resolution)> {
        let mut out = Vec::new();
        let mut seen_names = HashSet::new();
        let entry = self.entry;

        for entry_item in &self.tables[entry.0].exports {
            match entry_item {
                ExportEntry::Named { export_name, .. } => {
                    if seen_names.insert(export_name.clone()) {
                        let mut seen = HashSet::new();
                        out.push((
                            export_name.clone(),
                            self.resolve_export(entry, export_name, &mut seen),
                        ));
                    }
                }
                ExportEntry::Star { specifier } => {
                    if let ModuleRef::File(target) = self.module_ref(entry, specifier) {
                        let mut visited = HashSet::new();
                        for name in self.export_names(target, &mut visited) {
                            if seen_names.insert(name.clone()) {
                                let mut seen = HashSet::new();
                                out.push((
                                    name.clone(),
                                    mark_crossed(self.resolve_export(target, &name, &mut seen)),
                                ));
                            }
                        }
                    }
                }
            }
        }
        out
    }

    /// All export names of a module, own exports first, then star
    /// expansions, in order.
    fn export_names(&self, fid: FileId, visited: &mut HashSet<FileId>) -> Vec<String> {
        if !visited.insert(fid) {
            return Vec::new();
        }
        let mut names = Vec::new();
        for entry in &self.tables[fid.0].exports {
            match entry {
                ExportEntry::Named { export_name, .. } => names.push(export_name.clone()),
                ExportEntry::Star { specifier } => {
                    if let ModuleRef::File(target) = self.module_ref(fid, specifier) {
                        names.extend(self.export_names(target, visited));
                    }
                }
            }
        }
        names
    }

    /// The entry module's `@packageDocumentation` comment, if present.
    pub fn package_doc(&self) -> Option<String> {
        let file = self.file(self.entry);
        let root = file.root();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == "comment" {
                let text = file.node_text(child);
                if text.starts_with("/**") && text.contains("@packageDocumentation") {
                    return Some(text.to_string());
                }
            }
        }
        None
    }
}

fn mark_crossed(resolution: Resolution) -> Resolution {
    match resolution {
        Resolution::Symbol { key, .. } => Resolution::Symbol {
            key,
            crossed_import: true,
        },
        other => other,
    }
}

fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve a relative specifier against a directory, trying the standard
/// extension and index variants.
fn resolve_specifier(dir: &Path, specifier: &str) -> Option<PathBuf> {
    let base = dir.join(specifier);
    let candidates = [
        base.clone(),
        base.with_extension("ts"),
        base.with_extension("d.ts"),
        base.with_extension("tsx"),
        base.join("index.ts"),
        base.join("index.d.ts"),
    ];
    for candidate in candidates {
        if candidate.is_file() {
            return fs::canonicalize(&candidate).ok();
        }
    }
    None
}

fn string_literal_text(file: &SourceFile, node: Node) -> String {
    file.node_text(node)
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// Build the symbol table for one module.
fn build_table(file: &SourceFile, fid: FileId, messages: &mut MessageCollector) -> ModuleTable {
    let mut table = ModuleTable::default();
    let root = file.root();
    let mut cursor = root.walk();

    for child in root.children(&mut cursor) {
        match child.kind() {
            "comment" => {}
            "import_statement" => collect_import(file, fid, child, &mut table),
            "export_statement" => collect_export(file, fid, child, &mut table, messages),
            kind if is_declaration_statement(kind) => {
                register_declaration(file, fid, child, &mut table);
            }
            _ => {}
        }
    }
    table
}

fn collect_import(file: &SourceFile, fid: FileId, node: Node, table: &mut ModuleTable) {
    let mut specifier = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string" {
            specifier = Some(string_literal_text(file, child));
        }
    }
    let Some(specifier) = specifier else {
        return;
    };
    table
        .specifiers
        .push((specifier.clone(), NodeKey::of(fid, node)));

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for binding in child.children(&mut clause_cursor) {
            match binding.kind() {
                "identifier" => {
                    table.imports.insert(
                        file.node_text(binding).to_string(),
                        ImportBinding {
                            specifier: specifier.clone(),
                            imported: ImportedName::Default,
                        },
                    );
                }
                "namespace_import" => {
                    if let Some(name) = last_identifier(binding) {
                        table.imports.insert(
                            file.node_text(name).to_string(),
                            ImportBinding {
                                specifier: specifier.clone(),
                                imported: ImportedName::Namespace,
                            },
                        );
                    }
                }
                "named_imports" => {
                    let mut import_cursor = binding.walk();
                    for spec in binding.children(&mut import_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let name = spec
                            .child_by_field_name("name")
                            .map(|n| file.node_text(n).to_string());
                        let alias = spec
                            .child_by_field_name("alias")
                            .map(|n| file.node_text(n).to_string());
                        if let Some(name) = name {
                            let local = alias.unwrap_or_else(|| name.clone());
                            table.imports.insert(
                                local,
                                ImportBinding {
                                    specifier: specifier.clone(),
                                    imported: ImportedName::Named(name),
                                },
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn collect_export(
    file: &SourceFile,
    fid: FileId,
    node: Node,
    table: &mut ModuleTable,
    messages: &mut MessageCollector,
) {
    let mut has_default = false;
    let mut has_star = false;
    let mut source = None;
    let mut clause = None;
    let mut declaration = None;
    let mut default_identifier = None;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "=" => {
                let (line, col) = file.line_col(node.start_byte());
                messages.push(ExtractorMessage::new(
                    MessageId::UnsupportedSyntax,
                    "Export assignments (\"export =\") are not supported".to_string(),
                    file.rel_path.clone(),
                    line,
                    col,
                ));
                return;
            }
            "default" => has_default = true,
            "*" => has_star = true,
            "namespace_export" => {
                let (line, col) = file.line_col(node.start_byte());
                messages.push(ExtractorMessage::new(
                    MessageId::UnsupportedSyntax,
                    "Namespace re-exports (\"export * as ns\") are not supported".to_string(),
                    file.rel_path.clone(),
                    line,
                    col,
                ));
                return;
            }
            "string" => source = Some(string_literal_text(file, child)),
            "export_clause" => clause = Some(child),
            "identifier" => default_identifier = Some(file.node_text(child).to_string()),
            kind if is_declaration_statement(kind) => declaration = Some(child),
            _ => {}
        }
    }

    if let Some(specifier) = &source {
        table
            .specifiers
            .push((specifier.clone(), NodeKey::of(fid, node)));
    }

    if let Some(decl) = declaration {
        let names = register_declaration(file, fid, decl, table);
        for name in names {
            let export_name = if has_default {
                "default".to_string()
            } else {
                name.clone()
            };
            table.add_export(export_name, ExportTarget::Local(name));
        }
        return;
    }

    if let Some(clause) = clause {
        let mut clause_cursor = clause.walk();
        for spec in clause.children(&mut clause_cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let Some(name) = spec
                .child_by_field_name("name")
                .map(|n| file.node_text(n).to_string())
            else {
                continue;
            };
            let alias = spec
                .child_by_field_name("alias")
                .map(|n| file.node_text(n).to_string());
            let export_name = alias.unwrap_or_else(|| name.clone());
            let target = match &source {
                Some(specifier) => ExportTarget::Reexport {
                    specifier: specifier.clone(),
                    name,
                },
                None => ExportTarget::Local(name),
            };
            table.add_export(export_name, target);
        }
        return;
    }

    if has_star {
        if let Some(specifier) = source {
            table.exports.push(ExportEntry::Star { specifier });
        }
        return;
    }

    if has_default {
        if let Some(name) = default_identifier {
            table.add_export("default".to_string(), ExportTarget::Local(name));
        }
    }
}

/// Register the names a declaration statement introduces. Returns them in
/// source order.
fn register_declaration(
    file: &SourceFile,
    fid: FileId,
    node: Node,
    table: &mut ModuleTable,
) -> Vec<String> {
    match node.kind() {
        "ambient_declaration" => {
            let mut names = Vec::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if is_declaration_statement(child.kind()) {
                    names.extend(register_declaration(file, fid, child, table));
                }
            }
            names
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut names = Vec::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "variable_declarator" {
                    if let Some(name_node) = child.child_by_field_name("name") {
                        let name = file.node_text(name_node).to_string();
                        table.register_decl(name.clone(), NodeKey::of(fid, child));
                        names.push(name);
                    }
                }
            }
            names
        }
        _ => match node.child_by_field_name("name") {
            Some(name_node) => {
                let name = string_literal_text(file, name_node);
                table.register_decl(name.clone(), NodeKey::of(fid, node));
                vec![name]
            }
            None => Vec::new(),
        },
    }
}

fn last_identifier(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let mut found = None;
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            found = Some(child);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn load(files: &[(&str, &str)]) -> (Program, MessageCollector) {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        let program = Program::load(&temp.path().join(files[0].0)).unwrap();
        // TempDir is deleted on drop; everything is already in memory.
        program
    }

    #[test]
    fn test_entry_exports_in_declaration_order() {
        let (program, _) = load(&[(
            "index.ts",
            "export class B {}\nexport class A {}\nexport function f(): void;\n",
        )]);
        let exports = program.entry_exports();
        let names: Vec<_> = exports.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "f"]);
    }

    #[test]
    fn test_alias_following_through_reexport() {
        let (program, _) = load(&[
            ("index.ts", "export { Widget } from './widget';\n"),
            ("widget.ts", "export class Widget {}\n"),
        ]);
        let exports = program.entry_exports();
        assert_eq!(exports.len(), 1);
        match &exports[0].1 {
            Resolution::Symbol {
                key: SymbolKey::Local { name, .. },
                crossed_import,
            } => {
                assert_eq!(name, "Widget");
                assert!(crossed_import);
            }
            other => panic!("expected local symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_renamed_export() {
        let (program, _) = load(&[
            ("index.ts", "import { Gadget } from './g';\nexport { Gadget as Tool };\n"),
            ("g.ts", "export class Gadget {}\n"),
        ]);
        let exports = program.entry_exports();
        assert_eq!(exports[0].0, "Tool");
        match &exports[0].1 {
            Resolution::Symbol {
                key: SymbolKey::Local { name, .. },
                ..
            } => assert_eq!(name, "Gadget"),
            other => panic!("expected local symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_star_export_expansion() {
        let (program, _) = load(&[
            ("index.ts", "export * from './parts';\n"),
            ("parts.ts", "export class Bolt {}\nexport class Nut {}\n"),
        ]);
        let names: Vec<_> = program
            .entry_exports()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["Bolt", "Nut"]);
    }

    #[test]
    fn test_external_import_is_nominal() {
        let (program, _) = load(&[(
            "index.ts",
            "import { EventEmitter } from 'events';\nexport class Bus extends EventEmitter {}\n",
        )]);
        match program.resolve_type_name(program.entry(), "EventEmitter") {
            Resolution::Symbol {
                key: SymbolKey::External { package, name },
                ..
            } => {
                assert_eq!(package, "events");
                assert_eq!(name, "EventEmitter");
            }
            other => panic!("expected external symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_is_ambient() {
        let (program, _) = load(&[("index.ts", "export declare function now(): Date;\n")]);
        assert_eq!(
            program.resolve_type_name(program.entry(), "Date"),
            Resolution::Ambient
        );
    }

    #[test]
    fn test_missing_module_reports_warning() {
        let (program, messages) = load(&[("index.ts", "export { X } from './missing';\n")]);
        assert_eq!(messages.warning_count(), 1);
        let exports = program.entry_exports();
        assert!(matches!(exports[0].1, Resolution::Broken(_)));
    }

    #[test]
    fn test_export_assignment_is_unsupported() {
        let (_, messages) = load(&[("index.ts", "declare function f(): void;\nexport = f;\n")]);
        assert!(messages
            .messages()
            .iter()
            .any(|m| m.id == MessageId::UnsupportedSyntax));
    }

    #[test]
    fn test_merged_declarations_keep_source_order() {
        let (program, _) = load(&[(
            "index.ts",
            "export interface I { a: string; }\nexport interface I { b: number; }\n",
        )]);
        let key = SymbolKey::Local {
            file: program.entry(),
            name: "I".to_string(),
        };
        let decls = program.declarations_of(&key);
        assert_eq!(decls.len(), 2);
        assert!(decls[0].start < decls[1].start);
    }

    #[test]
    fn test_package_doc_detection() {
        let (program, _) = load(&[(
            "index.ts",
            "/**\n * The lib.\n * @packageDocumentation\n */\nexport class A {}\n",
        )]);
        assert!(program.package_doc().is_some());
    }
}
