//! Server state and feature handlers.
//!
//! The server owns the document store, the module cache, and the
//! scheduler. Each feature handler is a pure function of cached state
//! and a position:
//! - definition and references may parse *other* files on demand
//!   (import targets, workspace candidates), never the document being
//!   queried — that one always answers from its last good module;
//! - completion reads only the cache, since the document is usually
//!   mid-keystroke and unparseable.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use couleuvre_analysis::provider::ModuleProvider;
use couleuvre_analysis::references::find_all_references;
use couleuvre_analysis::resolve::resolve_word;
use couleuvre_analysis::{completion, symbols, Module};
use couleuvre_compiler::CompilerGateway;
use couleuvre_core::protocol::{CompletionItem, DocumentSymbol, Location, Position};
use couleuvre_core::{text, uri};
use tracing::{debug, info};

use crate::cache::{DocumentStore, ModuleCache};
use crate::scheduler::{AnalysisScheduler, DiagnosticsSink, SchedulerConfig, SharedRoot};

/// The language server.
pub struct Server {
    documents: DocumentStore,
    cache: Arc<ModuleCache>,
    scheduler: Arc<AnalysisScheduler>,
    workspace_root: SharedRoot,
}

impl Server {
    /// Build a server around a gateway and a diagnostics sink.
    pub fn new(
        gateway: Arc<dyn CompilerGateway>,
        sink: Arc<dyn DiagnosticsSink>,
        config: SchedulerConfig,
        runtime: tokio::runtime::Handle,
    ) -> Server {
        let cache = Arc::new(ModuleCache::new());
        let workspace_root: SharedRoot = Arc::new(RwLock::new(None));
        let scheduler = AnalysisScheduler::new(
            gateway,
            Arc::clone(&cache),
            sink,
            Arc::clone(&workspace_root),
            config,
            runtime,
        );
        info!("language server state created");
        Server {
            documents: DocumentStore::new(),
            cache,
            scheduler,
            workspace_root,
        }
    }

    /// Record the workspace root from the initialize request.
    pub fn set_workspace_root(&self, root: Option<PathBuf>) {
        if let Some(root) = &root {
            info!(root = %root.display(), "workspace root set");
        }
        *self.workspace_root.write().expect("root lock") = root;
    }

    // ------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------

    /// A document was opened: parse now, prefetch imports, schedule
    /// diagnostics.
    pub fn did_open(&self, uri: &str, text: &str) {
        debug!(uri, "document opened");
        self.documents.insert(uri, text.to_string());
        self.scheduler.parse_document(uri, text);
        self.scheduler.schedule_diagnostics(uri, text);
    }

    /// A document changed: debounce a reparse and fresh diagnostics.
    pub fn did_change(&self, uri: &str, text: &str) {
        debug!(uri, "document changed");
        self.documents.insert(uri, text.to_string());
        self.scheduler.schedule_parse(uri, text);
        self.scheduler.schedule_diagnostics(uri, text);
    }

    /// A document closed: drop its state.
    pub fn did_close(&self, uri: &str) {
        debug!(uri, "document closed");
        self.documents.remove(uri);
        self.scheduler.invalidate(uri);
    }

    // ------------------------------------------------------------------
    // Features
    // ------------------------------------------------------------------

    /// Go to the definition of the symbol at the cursor.
    pub fn definition(&self, uri: &str, position: Position) -> Option<Location> {
        let module = self.module_for(uri)?;
        let word = self.word_at(uri, position)?;
        let provider = LoadingProvider { server: self };
        let resolved = resolve_word(&provider, uri, &module, &word, Some(position))?;
        match resolved.node {
            // The import-itself sentinel: the start of the imported
            // file, not a specific node.
            None => Some(Location::at_start(resolved.uri)),
            Some(node) => Some(Location::new(
                resolved.uri.clone(),
                resolved.module.ast.span(node).to_range(),
            )),
        }
    }

    /// All references to the symbol at the cursor.
    pub fn references(
        &self,
        uri: &str,
        position: Position,
        include_declaration: bool,
    ) -> Vec<Location> {
        let Some(module) = self.module_for(uri) else {
            return Vec::new();
        };
        let Some(word) = self.word_at(uri, position) else {
            return Vec::new();
        };
        let provider = LoadingProvider { server: self };
        let Some(resolved) = resolve_word(&provider, uri, &module, &word, Some(position)) else {
            return Vec::new();
        };
        let loaded = self.cache.snapshot();
        let workspace_root = self.workspace_root.read().expect("root lock").clone();
        find_all_references(
            &provider,
            &resolved,
            (uri, &module),
            &loaded,
            workspace_root.as_deref(),
            include_declaration,
        )
    }

    /// The outline of a document.
    pub fn document_symbols(&self, uri: &str) -> Vec<DocumentSymbol> {
        match self.module_for(uri) {
            Some(module) => symbols::document_symbols(&module),
            None => Vec::new(),
        }
    }

    /// Completion items at the cursor.
    ///
    /// Reads the last successfully cached module directly; never forces
    /// a reparse.
    pub fn completion(&self, uri: &str, position: Position) -> Vec<CompletionItem> {
        let Some(module) = self.cache.get(uri) else {
            return Vec::new();
        };
        let Some(text) = self.documents.get(uri) else {
            return Vec::new();
        };
        let provider = CacheOnlyProvider { cache: &self.cache };
        completion::completions(&provider, &module, &text, position)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// The module for a document, parsing once if nothing is cached.
    fn module_for(&self, uri: &str) -> Option<Arc<Module>> {
        if let Some(module) = self.cache.get(uri) {
            return Some(module);
        }
        match self.documents.get(uri) {
            Some(text) => {
                self.scheduler.parse_document(uri, &text);
                self.cache.get(uri)
            }
            None => self.scheduler.load(uri),
        }
    }

    /// The dotted word under the cursor, from the live document text.
    fn word_at(&self, uri: &str, position: Position) -> Option<String> {
        let text = match self.documents.get(uri) {
            Some(text) => text,
            None => {
                let path = uri::to_fs_path(uri)?;
                std::fs::read_to_string(path).ok()?
            }
        };
        text::attribute_word_at(&text, position)
    }
}

/// Provider that may parse files on demand (navigation).
struct LoadingProvider<'a> {
    server: &'a Server,
}

impl ModuleProvider for LoadingProvider<'_> {
    fn module(&self, uri: &str) -> Option<Arc<Module>> {
        self.server.scheduler.load(uri)
    }
}

/// Provider that answers from the cache only (completion).
struct CacheOnlyProvider<'a> {
    cache: &'a ModuleCache,
}

impl ModuleProvider for CacheOnlyProvider<'_> {
    fn module(&self, uri: &str) -> Option<Arc<Module>> {
        self.cache.get(uri)
    }
}
