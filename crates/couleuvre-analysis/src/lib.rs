//! Symbol resolution and analysis engine for couleuvre.
//!
//! This crate turns a typed AST into answers for the editor:
//! - [`Module`]: one parsed source file with its symbol table, categorized
//!   definition sets, and import map
//! - [`SymbolTable`] / [`SymbolEntry`]: the unified per-module symbol index
//! - [`pattern`]: reference patterns, chain extraction, alias rewriting
//! - [`resolve`]: identifier chain + cursor → definition
//! - [`references`]: occurrence search, single-module and cross-module
//! - [`symbols`]: document outline
//! - [`completion`]: `self.` and `<alias>.` suggestions
//!
//! A module is built atomically from a successful parse and replaces the
//! previous module for its URI wholesale; nothing in this crate mutates a
//! module after construction, which is what makes sharing them across
//! query threads as `Arc<Module>` sound.

pub mod completion;
pub mod module;
pub mod pattern;
pub mod provider;
pub mod references;
pub mod resolve;
pub mod symbol_table;
pub mod symbols;

mod builder;

pub use module::Module;
pub use pattern::ReferencePattern;
pub use provider::ModuleProvider;
pub use resolve::ResolvedSymbol;
pub use symbol_table::{EntryId, Scope, SymbolEntry, SymbolTable};
