//! Module cache and document store.
//!
//! The cache is the single shared resource of the server: scheduled
//! tasks write fully-built modules into it, queries read snapshots out
//! of it. It is owned by the server object — created at startup, entries
//! invalidated when their document closes — never an ambient global.
//!
//! Writes per URI are serialized by the scheduler's generation counters;
//! the lock here only guards map structure.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use couleuvre_analysis::Module;

/// URI → last successfully built module.
#[derive(Debug, Default)]
pub struct ModuleCache {
    inner: RwLock<HashMap<String, Arc<Module>>>,
}

impl ModuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        ModuleCache::default()
    }

    /// The module for a URI, if one has been built.
    pub fn get(&self, uri: &str) -> Option<Arc<Module>> {
        self.inner.read().expect("cache lock").get(uri).cloned()
    }

    /// Whether a module exists for the URI.
    pub fn contains(&self, uri: &str) -> bool {
        self.inner.read().expect("cache lock").contains_key(uri)
    }

    /// Publish a module, replacing any previous one for the URI.
    pub fn insert(&self, uri: impl Into<String>, module: Arc<Module>) {
        self.inner
            .write()
            .expect("cache lock")
            .insert(uri.into(), module);
    }

    /// Publish a module only if the URI has none yet.
    ///
    /// Import prefetch uses this so a background parse never clobbers a
    /// module built from the user's open buffer.
    pub fn insert_if_absent(&self, uri: impl Into<String>, module: Arc<Module>) {
        self.inner
            .write()
            .expect("cache lock")
            .entry(uri.into())
            .or_insert(module);
    }

    /// Drop the module for a URI.
    pub fn remove(&self, uri: &str) {
        self.inner.write().expect("cache lock").remove(uri);
    }

    /// A point-in-time snapshot of every loaded module.
    pub fn snapshot(&self) -> Vec<(String, Arc<Module>)> {
        self.inner
            .read()
            .expect("cache lock")
            .iter()
            .map(|(uri, module)| (uri.clone(), Arc::clone(module)))
            .collect()
    }
}

/// URI → current text of open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: RwLock<HashMap<String, String>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        DocumentStore::default()
    }

    /// The current text of an open document.
    pub fn get(&self, uri: &str) -> Option<String> {
        self.inner.read().expect("documents lock").get(uri).cloned()
    }

    /// Store the full text of a document.
    pub fn insert(&self, uri: impl Into<String>, text: String) {
        self.inner
            .write()
            .expect("documents lock")
            .insert(uri.into(), text);
    }

    /// Forget a closed document.
    pub fn remove(&self, uri: &str) {
        self.inner.write().expect("documents lock").remove(uri);
    }
}
