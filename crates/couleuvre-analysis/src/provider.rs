//! The seam between the analysis engine and module storage.
//!
//! The resolver and cross-module search need to look up other modules
//! (imports, workspace files) without knowing where they come from. The
//! server supplies two implementations: one that only reads the cache
//! (completion must never force a parse) and one that parses on demand
//! (navigation may).

use std::sync::Arc;

use crate::module::Module;

/// Source of modules by document URI.
pub trait ModuleProvider {
    /// Return the module for a URI, or `None` when it cannot be
    /// obtained. Not-found is an ordinary outcome, never an error.
    fn module(&self, uri: &str) -> Option<Arc<Module>>;
}

/// A provider over a fixed set of modules, for tests and for snapshot
/// queries that must not trigger parsing.
#[derive(Debug, Default)]
pub struct StaticProvider {
    modules: std::collections::HashMap<String, Arc<Module>>,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        StaticProvider::default()
    }

    /// Add a module under a URI.
    pub fn insert(&mut self, uri: impl Into<String>, module: Arc<Module>) {
        self.modules.insert(uri.into(), module);
    }
}

impl ModuleProvider for StaticProvider {
    fn module(&self, uri: &str) -> Option<Arc<Module>> {
        self.modules.get(uri).cloned()
    }
}
