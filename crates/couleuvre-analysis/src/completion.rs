//! Completion suggestions.
//!
//! Two trigger contexts are supported:
//! - `self.` — mutable state variables and internal functions of the
//!   current module
//! - `<alias>.` — the external namespace of an imported module
//!
//! Completion always reads cached modules through the provider; typing
//! `self.` makes the document syntactically invalid, so forcing a parse
//! here would only make the list flicker empty.

use std::sync::Arc;

use couleuvre_ast::{Ast, NodeId, NodeKind};
use couleuvre_core::protocol::{
    CompletionItem, CompletionItemKind, InsertTextFormat, Position, SymbolKind,
};
use couleuvre_core::{text, uri};

use crate::module::Module;
use crate::provider::ModuleProvider;

/// Completion items for the trigger context at the cursor, if any.
pub fn completions(
    provider: &dyn ModuleProvider,
    module: &Arc<Module>,
    document_text: &str,
    position: Position,
) -> Vec<CompletionItem> {
    let Some(trigger) = text::completion_trigger(document_text, position) else {
        return Vec::new();
    };
    if trigger == "self" {
        self_completions(module)
    } else {
        module_completions(provider, module, &trigger)
    }
}

/// Completions after `self.`: mutable state variables and internal
/// functions.
pub fn self_completions(module: &Module) -> Vec<CompletionItem> {
    let ast = &module.ast;
    let mut items = Vec::new();

    for &decl in &module.variables {
        let NodeKind::VariableDecl {
            target: Some(target),
            annotation,
            is_constant,
            is_immutable,
            ..
        } = ast.kind(decl)
        else {
            continue;
        };
        // Constants and immutables are not reachable through self.
        if *is_constant || *is_immutable {
            continue;
        }
        let NodeKind::Name { id: name } = ast.kind(*target) else {
            continue;
        };
        let detail = annotation
            .and_then(|a| type_name(ast, a))
            .unwrap_or_else(|| "state variable".to_string());
        items.push(CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::Variable),
            detail: Some(detail),
            documentation: Some(format!("State variable: {}", name)),
            insert_text: None,
            insert_text_format: None,
        });
    }

    for &func in &module.functions {
        let NodeKind::FunctionDef { name, .. } = ast.kind(func) else {
            continue;
        };
        if name.is_empty() || name.starts_with("__") || !is_internal_function(ast, func) {
            continue;
        }
        let signature = function_signature(ast, func);
        items.push(CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::Function),
            detail: Some(signature.clone()),
            documentation: Some(format!("Internal function: {}{}", name, signature)),
            insert_text: Some(format!("{}($0)", name)),
            insert_text_format: Some(InsertTextFormat::Snippet),
        });
    }

    items
}

/// Completions after `<alias>.`: the imported module's external
/// namespace.
pub fn module_completions(
    provider: &dyn ModuleProvider,
    module: &Module,
    alias: &str,
) -> Vec<CompletionItem> {
    let Some(path) = module.imports.get(alias) else {
        return Vec::new();
    };
    let Some(imported_uri) = uri::from_fs_path(path) else {
        return Vec::new();
    };
    let Some(imported) = provider.module(&imported_uri) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for (name, entry_id) in imported.symbol_table.external_symbols() {
        let entry = imported.symbol_table.entry(entry_id);
        let item = match entry.kind {
            SymbolKind::Function => {
                let signature = function_signature(&imported.ast, entry.node);
                CompletionItem {
                    label: name,
                    kind: Some(CompletionItemKind::Function),
                    detail: Some(signature.clone()),
                    documentation: Some(format!("Function: {}{}", entry.name, signature)),
                    insert_text: Some(format!("{}($0)", entry.name)),
                    insert_text_format: Some(InsertTextFormat::Snippet),
                }
            }
            SymbolKind::Variable | SymbolKind::Constant => {
                let detail = variable_type(&imported.ast, entry.node)
                    .unwrap_or_else(|| "variable".to_string());
                CompletionItem {
                    label: name,
                    kind: Some(entry.kind.into()),
                    detail: Some(detail),
                    documentation: None,
                    insert_text: None,
                    insert_text_format: None,
                }
            }
            SymbolKind::Struct => detail_item(name, CompletionItemKind::Struct, "struct"),
            SymbolKind::Interface => detail_item(name, CompletionItemKind::Interface, "interface"),
            SymbolKind::Event => detail_item(name, CompletionItemKind::Event, "event"),
            SymbolKind::Enum => detail_item(name, CompletionItemKind::Enum, "flag"),
            _ => CompletionItem::new(name, CompletionItemKind::Text),
        };
        items.push(item);
    }
    items
}

fn detail_item(label: String, kind: CompletionItemKind, detail: &str) -> CompletionItem {
    CompletionItem {
        label,
        kind: Some(kind),
        detail: Some(detail.to_string()),
        documentation: None,
        insert_text: None,
        insert_text_format: None,
    }
}

/// Whether a function lacks an `external`/`public` decorator.
fn is_internal_function(ast: &Ast, func: NodeId) -> bool {
    let NodeKind::FunctionDef { decorator_list, .. } = ast.kind(func) else {
        return false;
    };
    for &decorator in decorator_list {
        let name = match ast.kind(decorator) {
            NodeKind::Name { id } => Some(id.as_str()),
            NodeKind::Call {
                func: Some(callee), ..
            } => match ast.kind(*callee) {
                NodeKind::Name { id } => Some(id.as_str()),
                _ => None,
            },
            _ => None,
        };
        if matches!(name, Some("external") | Some("public")) {
            return false;
        }
    }
    true
}

/// Render `(a: uint256, b) -> bool` for display.
fn function_signature(ast: &Ast, func: NodeId) -> String {
    let NodeKind::FunctionDef { args, returns, .. } = ast.kind(func) else {
        return "()".to_string();
    };

    let mut parts: Vec<String> = Vec::new();
    if let Some(args) = args {
        if let NodeKind::Arguments { args, .. } = ast.kind(*args) {
            for &param in args {
                let NodeKind::Arg { name, annotation } = ast.kind(param) else {
                    continue;
                };
                match annotation.and_then(|a| type_name(ast, a)) {
                    Some(type_name) => parts.push(format!("{}: {}", name, type_name)),
                    None => parts.push(name.clone()),
                }
            }
        }
    }

    let return_part = returns
        .and_then(|r| type_name(ast, r))
        .map(|name| format!(" -> {}", name))
        .unwrap_or_default();

    format!("({}){}", parts.join(", "), return_part)
}

/// The annotated type of a state variable declaration.
fn variable_type(ast: &Ast, decl: NodeId) -> Option<String> {
    match ast.kind(decl) {
        NodeKind::VariableDecl { annotation, .. } | NodeKind::AnnAssign { annotation, .. } => {
            annotation.and_then(|a| type_name(ast, a))
        }
        _ => None,
    }
}

/// A display name for a type annotation node.
///
/// `DynArray[uint256, 10]` renders as `DynArray`; only simple names and
/// subscripts are attempted.
fn type_name(ast: &Ast, annotation: NodeId) -> Option<String> {
    match ast.kind(annotation) {
        NodeKind::Name { id } => Some(id.clone()),
        NodeKind::Subscript {
            value: Some(value), ..
        } => match ast.kind(*value) {
            NodeKind::Name { id } => Some(id.clone()),
            _ => None,
        },
        _ => None,
    }
}
