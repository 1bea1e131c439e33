//! Symbol table construction.
//!
//! A single pre-order pass over the typed AST produces everything a
//! module needs: the symbol table, the categorized definition sets, and
//! the import map. Dispatch is an exhaustive match over [`NodeKind`];
//! kinds that declare nothing (implements/uses/initializes/exports, the
//! whole expression grammar) fall through producing no symbol.

use std::collections::BTreeMap;
use std::path::PathBuf;

use couleuvre_ast::{Ast, NodeId, NodeKind};
use couleuvre_core::protocol::SymbolKind;

use crate::pattern::ReferencePattern;
use crate::symbol_table::{
    build_access_patterns, definition_identifier, is_constant_annotation, EntryId, Scope,
    SymbolEntry, SymbolTable,
};

/// Everything the single pass collects.
#[derive(Debug, Default)]
pub(crate) struct ModuleParts {
    pub table: SymbolTable,
    pub functions: Vec<NodeId>,
    pub variables: Vec<NodeId>,
    pub flags: Vec<NodeId>,
    pub events: Vec<NodeId>,
    pub structs: Vec<NodeId>,
    pub interfaces: Vec<NodeId>,
    /// Alias or canonical name → resolved absolute path.
    pub imports: BTreeMap<String, PathBuf>,
}

/// Run the pass over a tree.
pub(crate) fn build_symbols(ast: &Ast) -> ModuleParts {
    let mut builder = SymbolTableBuilder {
        ast,
        parts: ModuleParts::default(),
    };
    for &statement in ast.module_body() {
        builder.visit_top_level(statement);
    }
    builder.parts
}

struct SymbolTableBuilder<'a> {
    ast: &'a Ast,
    parts: ModuleParts,
}

impl<'a> SymbolTableBuilder<'a> {
    fn add_symbol(
        &mut self,
        name: String,
        node: NodeId,
        kind: SymbolKind,
        children: Vec<EntryId>,
    ) -> EntryId {
        let patterns = build_access_patterns(self.ast, node, &Scope::Module);
        self.parts.table.add(SymbolEntry {
            name,
            node,
            kind,
            scope: Scope::Module,
            access_patterns: patterns,
            parent_function: None,
            children,
        })
    }

    fn visit_top_level(&mut self, node: NodeId) {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::VariableDecl {
                is_constant,
                is_immutable,
                ..
            } => {
                self.parts.variables.push(node);
                let Some(name) = definition_identifier(ast, node) else {
                    return;
                };
                let kind = if *is_constant || *is_immutable {
                    SymbolKind::Constant
                } else {
                    SymbolKind::Variable
                };
                self.add_symbol(name, node, kind, vec![]);
            }
            // Older compilers emit state variables as annotated
            // assignments at module level.
            NodeKind::AnnAssign { annotation, .. } => {
                let Some(name) = definition_identifier(ast, node) else {
                    return;
                };
                let kind = if is_constant_annotation(ast, *annotation) {
                    SymbolKind::Constant
                } else {
                    SymbolKind::Variable
                };
                self.add_symbol(name, node, kind, vec![]);
            }
            NodeKind::FunctionDef {
                name, args, body, ..
            } => {
                self.parts.functions.push(node);
                if name.is_empty() {
                    return;
                }
                let mut children = Vec::new();
                self.collect_parameters(*args, node, name, &mut children);
                for &statement in body {
                    self.collect_locals(statement, node, name, &mut children);
                }
                self.add_symbol(name.clone(), node, SymbolKind::Function, children);
            }
            NodeKind::FlagDef { name, body } => {
                self.parts.flags.push(node);
                if name.is_empty() {
                    return;
                }
                let mut children = Vec::new();
                for &statement in body {
                    // Members appear as bare-name expression statements.
                    let NodeKind::Expr { value: Some(value) } = ast.kind(statement) else {
                        continue;
                    };
                    let NodeKind::Name { id } = ast.kind(*value) else {
                        continue;
                    };
                    let entry = SymbolEntry {
                        name: id.clone(),
                        node: *value,
                        kind: SymbolKind::EnumMember,
                        scope: Scope::Module,
                        access_patterns: vec![ReferencePattern::new(
                            [name.clone(), id.clone()],
                            false,
                        )],
                        parent_function: None,
                        children: vec![],
                    };
                    children.push(self.parts.table.add_child(entry));
                }
                self.add_symbol(name.clone(), node, SymbolKind::Enum, children);
            }
            NodeKind::EventDef { name, body } => {
                self.parts.events.push(node);
                if name.is_empty() {
                    return;
                }
                let children = self.collect_fields(body);
                self.add_symbol(name.clone(), node, SymbolKind::Event, children);
            }
            NodeKind::StructDef { name, body } => {
                self.parts.structs.push(node);
                if name.is_empty() {
                    return;
                }
                let children = self.collect_fields(body);
                self.add_symbol(name.clone(), node, SymbolKind::Struct, children);
            }
            NodeKind::InterfaceDef { name, body } => {
                self.parts.interfaces.push(node);
                if name.is_empty() {
                    return;
                }
                let mut children = Vec::new();
                for &statement in body {
                    let NodeKind::FunctionDef {
                        name: method_name, ..
                    } = ast.kind(statement)
                    else {
                        continue;
                    };
                    if method_name.is_empty() {
                        continue;
                    }
                    let entry = SymbolEntry {
                        name: method_name.clone(),
                        node: statement,
                        kind: SymbolKind::Method,
                        scope: Scope::Module,
                        access_patterns: vec![],
                        parent_function: None,
                        children: vec![],
                    };
                    children.push(self.parts.table.add_child(entry));
                }
                self.add_symbol(name.clone(), node, SymbolKind::Interface, children);
            }
            NodeKind::Import {
                name,
                alias,
                resolved_path,
            }
            | NodeKind::ImportFrom {
                name,
                alias,
                resolved_path,
                ..
            } => {
                // An import without a resolvable path is skipped, not an
                // error: the file may simply not exist on disk yet.
                let Some(path) = resolved_path else { return };
                let path = PathBuf::from(path);
                if let Some(alias) = alias {
                    self.parts.imports.insert(alias.clone(), path.clone());
                }
                if let Some(name) = name {
                    self.parts.imports.insert(name.clone(), path);
                }
            }
            // Visited, no symbol: implements/uses/initializes/exports
            // declarations and everything else that can appear top-level.
            _ => {}
        }
    }

    fn collect_parameters(
        &mut self,
        args: Option<NodeId>,
        function: NodeId,
        function_name: &str,
        children: &mut Vec<EntryId>,
    ) {
        let ast = self.ast;
        let Some(args) = args else { return };
        let NodeKind::Arguments { args, .. } = ast.kind(args) else {
            return;
        };
        for &param in args {
            let NodeKind::Arg {
                name: param_name, ..
            } = ast.kind(param)
            else {
                continue;
            };
            let entry = SymbolEntry {
                name: param_name.clone(),
                node: param,
                kind: SymbolKind::Variable,
                scope: Scope::Function(function_name.to_string()),
                access_patterns: vec![ReferencePattern::new([param_name.clone()], false)],
                parent_function: Some(function),
                children: vec![],
            };
            children.push(self.parts.table.add(entry));
        }
    }

    /// Collect event/struct fields: annotated assignments in the body.
    fn collect_fields(&mut self, body: &[NodeId]) -> Vec<EntryId> {
        let ast = self.ast;
        let mut children = Vec::new();
        for &statement in body {
            if !matches!(ast.kind(statement), NodeKind::AnnAssign { .. }) {
                continue;
            }
            let Some(field_name) = definition_identifier(ast, statement) else {
                continue;
            };
            let entry = SymbolEntry {
                name: field_name,
                node: statement,
                kind: SymbolKind::Field,
                scope: Scope::Module,
                access_patterns: vec![],
                parent_function: None,
                children: vec![],
            };
            children.push(self.parts.table.add_child(entry));
        }
        children
    }

    /// Collect local variable definitions inside a function body.
    ///
    /// Annotated assignments declare locals; `for` targets declare the
    /// loop variable at the variable's own name node (better location
    /// than the surrounding annotation); both `if` arms recurse.
    fn collect_locals(
        &mut self,
        node: NodeId,
        function: NodeId,
        function_name: &str,
        children: &mut Vec<EntryId>,
    ) {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::AnnAssign { .. } => {
                if let Some(name) = definition_identifier(ast, node) {
                    self.add_local(name, node, function, function_name, children);
                }
            }
            NodeKind::For { target, body, .. } => {
                match target.map(|t| (t, ast.kind(t))) {
                    Some((_, NodeKind::AnnAssign {
                        target: Some(inner),
                        ..
                    })) => {
                        if let NodeKind::Name { id } = ast.kind(*inner) {
                            self.add_local(id.clone(), *inner, function, function_name, children);
                        }
                    }
                    Some((target, NodeKind::Name { id })) => {
                        self.add_local(id.clone(), target, function, function_name, children);
                    }
                    _ => {}
                }
                for &statement in body {
                    self.collect_locals(statement, function, function_name, children);
                }
            }
            NodeKind::If { body, orelse, .. } => {
                for &statement in body {
                    self.collect_locals(statement, function, function_name, children);
                }
                for &statement in orelse {
                    self.collect_locals(statement, function, function_name, children);
                }
            }
            _ => {}
        }
    }

    fn add_local(
        &mut self,
        name: String,
        node: NodeId,
        function: NodeId,
        function_name: &str,
        children: &mut Vec<EntryId>,
    ) {
        let entry = SymbolEntry {
            name: name.clone(),
            node,
            kind: SymbolKind::Variable,
            scope: Scope::Function(function_name.to_string()),
            access_patterns: vec![ReferencePattern::new([name], false)],
            parent_function: Some(function),
            children: vec![],
        };
        children.push(self.parts.table.add(entry));
    }
}
