//! The unified per-module symbol table.
//!
//! Every definition in a module gets one [`SymbolEntry`] holding its
//! name, defining node, kind, scope, and prebuilt access patterns.
//! Entries live in an arena owned by the [`SymbolTable`]; the by-name and
//! by-scope indices hold ids, not copies, so there is exactly one source
//! of truth.
//!
//! Two insertion paths exist on purpose:
//! - [`SymbolTable::add`] indexes the entry, making it resolvable.
//! - [`SymbolTable::add_child`] stores it unindexed; flag members, event
//!   and struct fields, and interface methods are reachable only through
//!   their parent entry and must never satisfy a standalone lookup.
//!
//! ## Scope invariant
//!
//! An indexed entry's scope is either [`Scope::Module`] or the exact name
//! of a function defined in the same module. Local entries never
//! participate in cross-module search.

use std::collections::HashMap;

use couleuvre_ast::{Ast, NodeId, NodeKind};
use couleuvre_core::protocol::SymbolKind;

use crate::pattern::ReferencePattern;

// ============================================================================
// Ids and scopes
// ============================================================================

/// Identifier of an entry within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u32);

impl EntryId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a symbol is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Module level.
    Module,
    /// Local to the named function.
    Function(String),
}

impl Scope {
    /// The index key for this scope.
    pub fn key(&self) -> &str {
        match self {
            Scope::Module => "module",
            Scope::Function(name) => name,
        }
    }

    /// Whether this is a function-local scope.
    pub fn is_local(&self) -> bool {
        matches!(self, Scope::Function(_))
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One symbol definition.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    /// The symbol's identifier.
    pub name: String,
    /// The defining node; lives as long as the owning module.
    pub node: NodeId,
    /// The symbol's kind.
    pub kind: SymbolKind,
    /// The scope the symbol is visible in.
    pub scope: Scope,
    /// How the symbol is referred to, built once at definition time.
    pub access_patterns: Vec<ReferencePattern>,
    /// The containing function definition, for locals and parameters.
    pub parent_function: Option<NodeId>,
    /// Owned child entries (parameters and locals under a function,
    /// fields under events/structs, members under flags, methods under
    /// interfaces).
    pub children: Vec<EntryId>,
}

impl SymbolEntry {
    /// Whether this symbol is function-local.
    pub fn is_local(&self) -> bool {
        self.scope.is_local()
    }
}

// ============================================================================
// Table
// ============================================================================

/// All symbols of one module, with name and scope indices.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    by_name: HashMap<String, Vec<EntryId>>,
    by_scope: HashMap<String, Vec<EntryId>>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Insert an entry and index it by name and scope.
    pub fn add(&mut self, entry: SymbolEntry) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.by_name
            .entry(entry.name.clone())
            .or_default()
            .push(id);
        self.by_scope
            .entry(entry.scope.key().to_string())
            .or_default()
            .push(id);
        self.entries.push(entry);
        id
    }

    /// Insert an entry without indexing it.
    ///
    /// The entry is reachable only through its parent's `children` list;
    /// lookups by name or scope will never return it.
    pub fn add_child(&mut self, entry: SymbolEntry) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    /// Access an entry by id.
    pub fn entry(&self, id: EntryId) -> &SymbolEntry {
        &self.entries[id.index()]
    }

    /// All entries with the given name (indexed entries only).
    pub fn by_name(&self, name: &str) -> &[EntryId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All entries in the given scope, in definition order.
    pub fn by_scope(&self, scope: &str) -> &[EntryId] {
        self.by_scope.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Module-level entries in definition order.
    pub fn module_symbols(&self) -> &[EntryId] {
        self.by_scope("module")
    }

    /// Local entries of one function.
    pub fn local_symbols(&self, function_name: &str) -> &[EntryId] {
        self.by_scope(function_name)
    }

    /// Resolve an identifier chain to an entry.
    ///
    /// Single-name chains inside a function check the local scope first;
    /// a local hit always wins (shadowing). Otherwise module-scope
    /// entries are matched by exact access pattern, and single names may
    /// retry as `self.<name>` when the caller's cursor context allows
    /// the implicit-self form.
    pub fn resolve(
        &self,
        chain: &[String],
        enclosing_function: Option<&str>,
        allow_self_fallback: bool,
    ) -> Option<EntryId> {
        if chain.is_empty() {
            return None;
        }

        if chain.len() == 1 {
            if let Some(function) = enclosing_function {
                let hit = self
                    .local_symbols(function)
                    .iter()
                    .copied()
                    .find(|&id| self.entry(id).name == chain[0]);
                if hit.is_some() {
                    return hit;
                }
            }
        }

        if let Some(hit) = self.resolve_module_exact(chain) {
            return Some(hit);
        }

        if chain.len() == 1 && allow_self_fallback {
            let self_chain = vec!["self".to_string(), chain[0].clone()];
            return self.resolve_module_exact(&self_chain);
        }

        None
    }

    fn resolve_module_exact(&self, chain: &[String]) -> Option<EntryId> {
        self.module_symbols().iter().copied().find(|&id| {
            self.entry(id)
                .access_patterns
                .iter()
                .any(|pattern| pattern.chain == chain)
        })
    }

    /// Resolve a chain in this module's external namespace.
    ///
    /// The external namespace is what an importing module sees: every
    /// module-level name with the leading `self` stripped from its
    /// patterns. Only single names resolve; deeper chains would have to
    /// look inside a definition, which imports cannot do.
    pub fn resolve_external(&self, chain: &[String]) -> Option<EntryId> {
        let [name] = chain else { return None };
        self.module_symbols().iter().copied().find(|&id| {
            self.entry(id).access_patterns.iter().any(|pattern| {
                let stripped: &[String] = match pattern.chain.first() {
                    Some(head) if head == "self" => &pattern.chain[1..],
                    _ => &pattern.chain[..],
                };
                stripped.len() == 1 && stripped[0] == *name
            })
        })
    }

    /// Names and entries visible to importing modules, in definition
    /// order.
    pub fn external_symbols(&self) -> Vec<(String, EntryId)> {
        self.module_symbols()
            .iter()
            .copied()
            .map(|id| (self.entry(id).name.clone(), id))
            .collect()
    }
}

// ============================================================================
// Access pattern construction
// ============================================================================

/// Whether an `AnnAssign` annotation marks a constant or immutable.
pub(crate) fn is_constant_annotation(ast: &Ast, annotation: Option<NodeId>) -> bool {
    let Some(annotation) = annotation else {
        return false;
    };
    let NodeKind::Call { func: Some(func), .. } = ast.kind(annotation) else {
        return false;
    };
    matches!(
        ast.kind(*func),
        NodeKind::Name { id } if id == "constant" || id == "immutable"
    )
}

/// Build the access patterns for a definition node, per defining kind.
///
/// | kind | pattern | prefix |
/// |------|---------|--------|
/// | constant / immutable | `[name]` | no |
/// | mutable state variable | `[self, name]` | no |
/// | function | `[self, name]` | no |
/// | flag type | `[name]` | yes |
/// | event / struct / interface | `[name]` | no |
/// | local / parameter | `[name]` | no |
pub fn build_access_patterns(ast: &Ast, node: NodeId, scope: &Scope) -> Vec<ReferencePattern> {
    let Some(identifier) = definition_identifier(ast, node) else {
        return Vec::new();
    };

    if scope.is_local() {
        return vec![ReferencePattern::new([identifier], false)];
    }

    match ast.kind(node) {
        NodeKind::VariableDecl {
            is_constant,
            is_immutable,
            ..
        } => {
            if *is_constant || *is_immutable {
                vec![ReferencePattern::new([identifier], false)]
            } else {
                vec![ReferencePattern::new(["self".to_string(), identifier], false)]
            }
        }
        NodeKind::AnnAssign { annotation, .. } => {
            if is_constant_annotation(ast, *annotation) {
                vec![ReferencePattern::new([identifier], false)]
            } else if matches!(
                ast.parent(node).map(|p| ast.kind(p)),
                Some(NodeKind::Module { .. })
            ) {
                vec![ReferencePattern::new(["self".to_string(), identifier], false)]
            } else {
                vec![ReferencePattern::new([identifier], false)]
            }
        }
        NodeKind::FunctionDef { .. } => {
            vec![ReferencePattern::new(["self".to_string(), identifier], false)]
        }
        NodeKind::FlagDef { .. } => vec![ReferencePattern::new([identifier], true)],
        _ => vec![ReferencePattern::new([identifier], false)],
    }
}

/// The identifier a definition node declares, if any.
pub(crate) fn definition_identifier(ast: &Ast, node: NodeId) -> Option<String> {
    match ast.kind(node) {
        NodeKind::VariableDecl {
            target: Some(target),
            ..
        }
        | NodeKind::AnnAssign {
            target: Some(target),
            ..
        } => match ast.kind(*target) {
            NodeKind::Name { id } => Some(id.clone()),
            _ => None,
        },
        NodeKind::Arg { name, .. } => Some(name.clone()),
        NodeKind::Name { id } => Some(id.clone()),
        other => other.name().map(str::to_string),
    }
}
