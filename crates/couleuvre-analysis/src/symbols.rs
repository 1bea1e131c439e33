//! Document outline.
//!
//! The outline is read straight off the symbol table: module-scope
//! entries become top-level symbols, and their owned children (fields,
//! members, methods, parameters, locals) nest beneath them.

use couleuvre_core::protocol::DocumentSymbol;

use crate::module::Module;
use crate::symbol_table::EntryId;

/// Build the outline tree for a module.
pub fn document_symbols(module: &Module) -> Vec<DocumentSymbol> {
    module
        .symbol_table
        .module_symbols()
        .iter()
        .map(|&id| to_document_symbol(module, id))
        .collect()
}

fn to_document_symbol(module: &Module, id: EntryId) -> DocumentSymbol {
    let entry = module.symbol_table.entry(id);
    let range = module.ast.span(entry.node).to_range();
    DocumentSymbol {
        name: entry.name.clone(),
        kind: entry.kind,
        range,
        selection_range: range,
        children: entry
            .children
            .iter()
            .map(|&child| to_document_symbol(module, child))
            .collect(),
    }
}
