//! Reference search, single-module and cross-module.
//!
//! Whole-module search walks every node, extracts identifier chains, and
//! matches them against the symbol's access patterns. Names lexically
//! inside flag/event/struct bodies are skipped — they are member and
//! field declarations, not usages. Function-local search walks only the
//! enclosing function's subtree, where that exclusion is unnecessary
//! (declarations there are structurally distinct node kinds).
//!
//! Cross-module search widens to every loaded module plus on-disk files
//! under the workspace root that pass a cheap text prefilter. Modules
//! other than the defining one are searched with alias-rewritten
//! patterns, one set per import whose resolved path names the defining
//! module; they never contribute a declaration location.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use couleuvre_ast::NodeId;
use couleuvre_core::protocol::Location;
use couleuvre_core::{uri, workspace};
use tracing::debug;

use crate::module::Module;
use crate::pattern::{self, ReferencePattern};
use crate::provider::ModuleProvider;
use crate::resolve::ResolvedSymbol;

/// Find references matching `patterns` across a whole module.
///
/// When `include_declaration` is set and a definition node is given, its
/// location is added as well. Results are deduplicated by exact range so
/// a name nested inside an already-matched attribute chain is not
/// counted twice.
pub fn find_references(
    module: &Module,
    uri_str: &str,
    patterns: &[ReferencePattern],
    include_declaration: bool,
    definition: Option<NodeId>,
) -> Vec<Location> {
    collect_references(
        module,
        uri_str,
        patterns,
        include_declaration,
        definition,
        module.ast.root(),
        true,
    )
}

/// Find references to a local symbol within its containing function.
pub fn find_local_references(
    module: &Module,
    uri_str: &str,
    patterns: &[ReferencePattern],
    function: NodeId,
    include_declaration: bool,
    definition: Option<NodeId>,
) -> Vec<Location> {
    collect_references(
        module,
        uri_str,
        patterns,
        include_declaration,
        definition,
        function,
        false,
    )
}

fn collect_references(
    module: &Module,
    uri_str: &str,
    patterns: &[ReferencePattern],
    include_declaration: bool,
    definition: Option<NodeId>,
    from: NodeId,
    exclude_declaration_bodies: bool,
) -> Vec<Location> {
    if patterns.is_empty() {
        return Vec::new();
    }

    let ast = &module.ast;
    let mut locations: Vec<Location> = Vec::new();
    let mut seen: HashSet<(u32, u32, u32, u32)> = HashSet::new();
    let mut add = |locations: &mut Vec<Location>, node: NodeId| {
        let location = Location::new(uri_str, ast.span(node).to_range());
        if seen.insert(location.range_key()) {
            locations.push(location);
        }
    };

    if include_declaration {
        if let Some(definition) = definition {
            add(&mut locations, definition);
        }
    }

    for node in ast.descendants(from) {
        let Some(chain) = pattern::extract_chain(ast, node) else {
            continue;
        };
        if let Some(definition) = definition {
            if is_declaration_node(module, node, definition) {
                continue;
            }
        }
        if exclude_declaration_bodies && in_declaration_body(module, node) {
            continue;
        }
        if pattern::matches_any(&chain, patterns) {
            add(&mut locations, node);
        }
    }

    locations
}

/// Whether `candidate` is the declaration of `definition` itself.
///
/// For variable declarations the target name node counts too; go-to-def
/// lands on it and it must not double as a usage.
fn is_declaration_node(module: &Module, candidate: NodeId, definition: NodeId) -> bool {
    if candidate == definition {
        return true;
    }
    match module.ast.kind(definition) {
        couleuvre_ast::NodeKind::VariableDecl {
            target: Some(target),
            ..
        }
        | couleuvre_ast::NodeKind::AnnAssign {
            target: Some(target),
            ..
        } => candidate == *target,
        _ => false,
    }
}

/// Whether a node sits lexically inside a flag/event/struct body.
fn in_declaration_body(module: &Module, node: NodeId) -> bool {
    module
        .ast
        .ancestors(node)
        .any(|ancestor| module.ast.kind(ancestor).is_declaration_container())
}

/// The canonical path of a module at a URI (see
/// [`Module::canonical_path`]).
fn module_path(module: &Module, uri_str: &str) -> Option<PathBuf> {
    module.canonical_path(uri_str)
}

/// Find every reference to a resolved symbol.
///
/// Local symbols search only their containing function. Module-scope
/// symbols search the defining module with the original patterns, every
/// other candidate module with alias-rewritten patterns, and optionally
/// text-prefiltered files under the workspace root.
pub fn find_all_references(
    provider: &dyn ModuleProvider,
    resolved: &ResolvedSymbol,
    origin: (&str, &Arc<Module>),
    loaded: &[(String, Arc<Module>)],
    workspace_root: Option<&Path>,
    include_declaration: bool,
) -> Vec<Location> {
    let Some(definition) = resolved.node else {
        // The import-itself sentinel has no reference patterns.
        return Vec::new();
    };

    let entry = resolved.entry.map(|id| resolved.module.symbol_table.entry(id));
    let patterns: Vec<ReferencePattern> = entry
        .map(|entry| entry.access_patterns.clone())
        .unwrap_or_default();
    if patterns.is_empty() {
        return Vec::new();
    }

    // Function-local symbols never leave their function, let alone the
    // file.
    if let Some(entry) = entry {
        if entry.is_local() {
            let Some(function) = entry.parent_function else {
                return Vec::new();
            };
            return find_local_references(
                &resolved.module,
                &resolved.uri,
                &patterns,
                function,
                include_declaration,
                Some(definition),
            );
        }
    }

    let target_path = module_path(&resolved.module, &resolved.uri);

    // Candidate set: loaded modules plus the origin and defining
    // modules, deduplicated by URI, searched in URI order for
    // deterministic output.
    let mut candidates: HashMap<String, Arc<Module>> = HashMap::new();
    for (uri_str, module) in loaded {
        candidates
            .entry(uri_str.clone())
            .or_insert_with(|| Arc::clone(module));
    }
    candidates
        .entry(origin.0.to_string())
        .or_insert_with(|| Arc::clone(origin.1));
    candidates
        .entry(resolved.uri.clone())
        .or_insert_with(|| Arc::clone(&resolved.module));
    let mut ordered: Vec<(&String, &Arc<Module>)> = candidates.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0));

    let mut locations = Vec::new();
    let mut searched_paths: HashSet<PathBuf> = HashSet::new();

    for (uri_str, module) in ordered {
        let Some(path) = module_path(module, uri_str) else {
            continue;
        };
        searched_paths.insert(path.clone());

        let (search_patterns, definition_node) = match &target_path {
            Some(target) if *target == path => (patterns.clone(), Some(definition)),
            Some(target) => (alias_patterns(module, target, &patterns), None),
            None => continue,
        };
        if search_patterns.is_empty() {
            continue;
        }
        locations.extend(find_references(
            module,
            uri_str,
            &search_patterns,
            include_declaration,
            definition_node,
        ));
    }

    // Widen to workspace files that mention the symbol's bare name.
    if let (Some(root), Some(target)) = (workspace_root, &target_path) {
        let terms = pattern::search_terms(&patterns);
        for path in workspace::files_containing(root, &terms, &searched_paths) {
            let Some(file_uri) = uri::from_fs_path(&path) else {
                continue;
            };
            let Some(module) = provider.module(&file_uri) else {
                debug!(uri = %file_uri, "candidate file did not parse, skipping");
                continue;
            };
            let search_patterns = alias_patterns(&module, target, &patterns);
            if search_patterns.is_empty() {
                continue;
            }
            locations.extend(find_references(
                &module,
                &file_uri,
                &search_patterns,
                false,
                None,
            ));
        }
    }

    locations
}

/// Rewrite patterns for every import of `module` that resolves to the
/// defining module's canonical path.
fn alias_patterns(
    module: &Module,
    target_path: &Path,
    patterns: &[ReferencePattern],
) -> Vec<ReferencePattern> {
    let mut rewritten = Vec::new();
    for (alias, path) in &module.imports {
        if Module::canonical_import(path).as_path() == target_path {
            rewritten.extend(pattern::prefix_patterns(patterns, alias));
        }
    }
    rewritten
}
