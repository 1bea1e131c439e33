//! Symbol resolution: identifier chain + cursor → definition.
//!
//! Resolution order, for a dotted word split into a chain:
//! 1. A cursor inside a flag/event/struct body resolves to nothing —
//!    names there are member and field *declarations*, not usages.
//! 2. Single names inside a function check the function's local scope
//!    first; a local hit always wins (shadowing).
//! 3. Module-scope entries are matched by exact access pattern; single
//!    names may retry as `self.<name>` (the implicit-self legacy form)
//!    when the cursor sits in module or function context.
//! 4. A chain headed by an import alias resolves its remainder in the
//!    imported module's external namespace; an empty remainder is the
//!    import itself, rendered as the start of the imported file.
//! 5. Everything else is not-found, an ordinary result.
//!
//! Context checks (steps 1 and 3) use exact AST ancestry from the
//! smallest node at the cursor rather than comparing line numbers: a
//! multi-line top-level statement is still module context on its
//! continuation lines.

use std::sync::Arc;

use couleuvre_ast::{Ast, NodeId, NodeKind};
use couleuvre_core::protocol::Position;
use couleuvre_core::uri;
use tracing::debug;

use crate::module::Module;
use crate::provider::ModuleProvider;
use crate::symbol_table::EntryId;

/// Result of resolving a word to its definition.
///
/// `node` is `None` for the import-itself sentinel: the word named an
/// import alias with no member, and callers should render the start of
/// the imported file.
#[derive(Debug, Clone)]
pub struct ResolvedSymbol {
    /// The defining node within `module`, if there is one.
    pub node: Option<NodeId>,
    /// URI of the module the definition lives in.
    pub uri: String,
    /// The module the definition lives in.
    pub module: Arc<Module>,
    /// The symbol table entry, when resolution went through the table.
    pub entry: Option<EntryId>,
}

/// Resolve a dotted word at a cursor position.
pub fn resolve_word(
    provider: &dyn ModuleProvider,
    uri_str: &str,
    module: &Arc<Module>,
    word: &str,
    position: Option<Position>,
) -> Option<ResolvedSymbol> {
    let chain: Vec<String> = word.split('.').map(str::to_string).collect();
    if chain.iter().any(String::is_empty) {
        return None;
    }

    if let Some(position) = position {
        if is_declaration_context(&module.ast, position) {
            return None;
        }
    }

    let enclosing = position.and_then(|p| enclosing_function(module, p));
    let allow_self_fallback = position
        .map(|p| self_fallback_eligible(&module.ast, p))
        .unwrap_or(true);

    if let Some(entry_id) =
        module
            .symbol_table
            .resolve(&chain, enclosing.as_deref(), allow_self_fallback)
    {
        let entry = module.symbol_table.entry(entry_id);
        return Some(ResolvedSymbol {
            node: Some(entry.node),
            uri: uri_str.to_string(),
            module: Arc::clone(module),
            entry: Some(entry_id),
        });
    }

    resolve_through_import(provider, module, &chain)
}

/// Resolve a chain whose head is an import alias.
fn resolve_through_import(
    provider: &dyn ModuleProvider,
    module: &Arc<Module>,
    chain: &[String],
) -> Option<ResolvedSymbol> {
    let (head, rest) = chain.split_first()?;
    let path = module.imports.get(head)?;
    let imported_uri = uri::from_fs_path(path)?;
    let imported = provider.module(&imported_uri)?;

    if rest.is_empty() {
        // The word names the import itself.
        return Some(ResolvedSymbol {
            node: None,
            uri: imported_uri,
            module: imported,
            entry: None,
        });
    }

    let entry_id = imported.symbol_table.resolve_external(rest)?;
    let entry = imported.symbol_table.entry(entry_id);
    debug!(alias = %head, symbol = %entry.name, "resolved through import");
    Some(ResolvedSymbol {
        node: Some(entry.node),
        uri: imported_uri,
        module: Arc::clone(&imported),
        entry: Some(entry_id),
    })
}

/// The name of the top-level function whose span contains the cursor.
pub fn enclosing_function(module: &Module, position: Position) -> Option<String> {
    enclosing_function_node(module, position).and_then(|id| {
        module
            .ast
            .kind(id)
            .name()
            .map(str::to_string)
    })
}

/// The top-level function definition whose span contains the cursor.
pub fn enclosing_function_node(module: &Module, position: Position) -> Option<NodeId> {
    let line = position.line + 1;
    module.ast.module_body().iter().copied().find(|&id| {
        matches!(module.ast.kind(id), NodeKind::FunctionDef { .. })
            && module.ast.span(id).contains_line(line)
    })
}

/// Whether the cursor sits inside a flag/event/struct body.
///
/// A cursor on the definition's header (the smallest covering node is
/// the definition itself, on its first line) is not a declaration
/// context; strictly below the header, or on any node of the body, it
/// is.
pub fn is_declaration_context(ast: &Ast, position: Position) -> bool {
    let Some(node) = ast.node_at(position) else {
        return false;
    };
    if ast.kind(node).is_declaration_container() {
        return position.line + 1 > ast.span(node).lineno;
    }
    ast.ancestors(node)
        .any(|ancestor| ast.kind(ancestor).is_declaration_container())
}

/// Whether the implicit-self fallback applies at the cursor.
///
/// The fallback is permitted in module context and inside function
/// bodies, and rejected inside declaration bodies (flags, events,
/// structs, and interface bodies). Decided by walking the ancestry of
/// the smallest node at the cursor, so multi-line top-level statements
/// stay eligible on their continuation lines.
pub fn self_fallback_eligible(ast: &Ast, position: Position) -> bool {
    let Some(node) = ast.node_at(position) else {
        // Outside every node: blank module-level area.
        return true;
    };
    let mut current = node;
    loop {
        match ast.kind(current) {
            NodeKind::Module { .. } => return true,
            // A top-level function body is eligible context; a method
            // signature inside an interface body is not, so keep
            // climbing there.
            NodeKind::FunctionDef { .. }
                if matches!(
                    ast.parent(current).map(|p| ast.kind(p)),
                    Some(NodeKind::Module { .. }) | None
                ) =>
            {
                return true
            }
            NodeKind::FlagDef { .. }
            | NodeKind::EventDef { .. }
            | NodeKind::StructDef { .. }
            | NodeKind::InterfaceDef { .. } => {
                // The header line of the definition is still module
                // context; its body is not.
                return current == node && position.line + 1 == ast.span(current).lineno;
            }
            _ => {}
        }
        match ast.parent(current) {
            Some(parent) => current = parent,
            None => return true,
        }
    }
}
