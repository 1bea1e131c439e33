//! The per-file analysis unit.
//!
//! A [`Module`] bundles one parsed source file: its AST, its symbol
//! table, categorized definition sets, and the import map. Modules are
//! built atomically from a successful parse; a new module wholly
//! replaces the previous one for its URI. Nothing mutates a module after
//! construction, so they are shared across threads as `Arc<Module>`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use couleuvre_ast::{Ast, NodeId};
use couleuvre_core::uri;
use sha2::{Digest, Sha256};

use crate::builder::build_symbols;
use crate::symbol_table::SymbolTable;

/// A parsed module with its symbol information.
#[derive(Debug)]
pub struct Module {
    /// Compiler version the module was parsed with.
    pub version: String,
    /// The owned syntax tree.
    pub ast: Ast,
    /// The unified symbol table.
    pub symbol_table: SymbolTable,
    /// Function definitions, in source order.
    pub functions: Vec<NodeId>,
    /// State variable declarations, in source order.
    pub variables: Vec<NodeId>,
    /// Flag definitions, in source order.
    pub flags: Vec<NodeId>,
    /// Event definitions, in source order.
    pub events: Vec<NodeId>,
    /// Struct definitions, in source order.
    pub structs: Vec<NodeId>,
    /// Interface definitions, in source order.
    pub interfaces: Vec<NodeId>,
    /// Import alias or canonical name → resolved absolute path.
    pub imports: BTreeMap<String, PathBuf>,
    /// Hash of the source text this module was built from.
    pub source_hash: String,
}

impl Module {
    /// Build a module from a parsed tree.
    pub fn build(ast: Ast, version: impl Into<String>, source: &str) -> Module {
        let parts = build_symbols(&ast);
        Module {
            version: version.into(),
            ast,
            symbol_table: parts.table,
            functions: parts.functions,
            variables: parts.variables,
            flags: parts.flags,
            events: parts.events,
            structs: parts.structs,
            interfaces: parts.interfaces,
            imports: parts.imports,
            source_hash: source_hash(source),
        }
    }

    /// The canonical filesystem path identifying this module.
    ///
    /// Prefers the path derived from the document URI: the path the
    /// compiler reports may be a scratch file created for an unsaved
    /// buffer.
    pub fn canonical_path(&self, uri_str: &str) -> Option<PathBuf> {
        let path = match uri::to_fs_path(uri_str) {
            Some(path) => path,
            None => PathBuf::from(self.ast.resolved_path()?),
        };
        Some(uri::canonical_path(&path))
    }

    /// Canonical form of an import target path.
    pub fn canonical_import(path: &Path) -> PathBuf {
        uri::canonical_path(path)
    }
}

/// Hex digest identifying a source text.
pub fn source_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
