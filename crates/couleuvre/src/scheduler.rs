//! The incremental analysis scheduler.
//!
//! Every open document gets two independent debounced pipelines:
//! - **fast**: reparse to a module (navigation, completion), short delay
//! - **slow**: full compilation to diagnostics, longer delay
//!
//! Editing a document schedules a replacement task for its pipeline and
//! supersedes the previous one: last edit wins, nothing queues. A
//! superseded task may still be sitting in its gateway call — the
//! subprocess is not killed, the result is checked against the
//! pipeline's generation counter at publish time and discarded when
//! stale. Cancelled work therefore never mutates the module map and
//! never publishes diagnostics.
//!
//! Gateway calls run on blocking worker threads, never on the protocol
//! loop. Queries only ever observe fully-built modules: the cache is
//! written once, after `Module::build` completes.
//!
//! A successful reparse schedules best-effort background parses for the
//! module's imports (recursive, memoized by URI) so cross-module
//! navigation has no first-use latency; an import's own parse failure is
//! swallowed — imports need not be independently valid.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use couleuvre_analysis::module::source_hash;
use couleuvre_analysis::Module;
use couleuvre_compiler::diagnostics::{create_diagnostic, parse_error_location};
use couleuvre_compiler::version::installed_vyper_version;
use couleuvre_compiler::{CompilerGateway, GatewayError, ParseRequest};
use couleuvre_core::protocol::{Diagnostic, DiagnosticSeverity};
use couleuvre_core::uri;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ModuleCache;

/// Where published diagnostics go (the transport, in production).
pub trait DiagnosticsSink: Send + Sync {
    /// Replace the diagnostics shown for a document.
    fn publish(&self, uri: &str, diagnostics: Vec<Diagnostic>);
}

/// Workspace root shared between the server and the scheduler; set at
/// initialization time.
pub type SharedRoot = Arc<RwLock<Option<PathBuf>>>;

/// Pipeline delays.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Debounce before a reparse (short: navigation should feel live).
    pub parse_delay: Duration,
    /// Debounce before a full compile (longer: compilation is slow).
    pub diagnostics_delay: Duration,
    /// Pause before a background import parse, so it does not compete
    /// with the main document's reparse.
    pub prefetch_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            parse_delay: Duration::from_millis(300),
            diagnostics_delay: Duration::from_millis(1000),
            prefetch_delay: Duration::from_millis(100),
        }
    }
}

/// Per-document pipeline state.
///
/// The generation counters implement last-edit-wins: results are only
/// published by the task holding the current generation.
#[derive(Default)]
struct PipelineState {
    parse_generation: u64,
    parse_task: Option<JoinHandle<()>>,
    diagnostics_generation: u64,
    diagnostics_task: Option<JoinHandle<()>>,
}

/// Debounced reparse and diagnostics scheduling for all documents.
pub struct AnalysisScheduler {
    gateway: Arc<dyn CompilerGateway>,
    cache: Arc<ModuleCache>,
    sink: Arc<dyn DiagnosticsSink>,
    workspace_root: SharedRoot,
    config: SchedulerConfig,
    runtime: Handle,
    pipelines: Mutex<HashMap<String, PipelineState>>,
    default_version: Mutex<Option<String>>,
    /// Import URIs with a prefetch in flight, so each is parsed once.
    prefetching: Mutex<HashSet<String>>,
}

impl AnalysisScheduler {
    /// Create a scheduler.
    pub fn new(
        gateway: Arc<dyn CompilerGateway>,
        cache: Arc<ModuleCache>,
        sink: Arc<dyn DiagnosticsSink>,
        workspace_root: SharedRoot,
        config: SchedulerConfig,
        runtime: Handle,
    ) -> Arc<AnalysisScheduler> {
        let default_version = installed_vyper_version();
        if let Some(version) = &default_version {
            info!(version = %version, "default compiler version from environment");
        }
        Arc::new(AnalysisScheduler {
            gateway,
            cache,
            sink,
            workspace_root,
            config,
            runtime,
            pipelines: Mutex::new(HashMap::new()),
            default_version: Mutex::new(default_version),
            prefetching: Mutex::new(HashSet::new()),
        })
    }

    /// The version used for sources without a pragma.
    pub fn default_version(&self) -> Option<String> {
        self.default_version.lock().expect("version lock").clone()
    }

    /// Parse a document immediately on the calling thread.
    ///
    /// Used on open, where there is nothing to debounce yet. Still goes
    /// through the generation bookkeeping, so a stale background task
    /// cannot overwrite the result.
    pub fn parse_document(self: &Arc<Self>, uri: &str, text: &str) -> bool {
        let generation = self.begin_parse(uri);
        self.run_parse(uri, text, generation)
    }

    /// Schedule a debounced reparse, superseding any pending one.
    pub fn schedule_parse(self: &Arc<Self>, uri: &str, text: &str) {
        let generation = self.begin_parse(uri);
        let this = Arc::clone(self);
        let task_uri = uri.to_string();
        let text = text.to_string();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(this.config.parse_delay).await;
            let worker = Arc::clone(&this);
            let worker_uri = task_uri.clone();
            let _ = tokio::task::spawn_blocking(move || {
                worker.run_parse(&worker_uri, &text, generation);
            })
            .await;
        });
        self.store_parse_task(uri, task);
    }

    /// Schedule debounced full-compilation diagnostics.
    pub fn schedule_diagnostics(self: &Arc<Self>, uri: &str, text: &str) {
        let generation = self.begin_diagnostics(uri);
        let this = Arc::clone(self);
        let task_uri = uri.to_string();
        let text = text.to_string();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(this.config.diagnostics_delay).await;
            let worker = Arc::clone(&this);
            let worker_uri = task_uri.clone();
            let _ = tokio::task::spawn_blocking(move || {
                worker.run_diagnostics(&worker_uri, &text, generation);
            })
            .await;
        });
        self.store_diagnostics_task(uri, task);
    }

    /// Obtain a module for any URI, parsing the file on demand.
    ///
    /// Used by navigation when it needs a module that is not open in the
    /// editor (an import target, a workspace search candidate).
    pub fn load(self: &Arc<Self>, uri: &str) -> Option<Arc<Module>> {
        if let Some(module) = self.cache.get(uri) {
            return Some(module);
        }
        let path = uri::to_fs_path(uri)?;
        self.parse_import(uri, &path);
        self.cache.get(uri)
    }

    /// Drop a closed document: cancel its pipelines, evict its module,
    /// clear its diagnostics.
    pub fn invalidate(&self, uri: &str) {
        if let Some(state) = self.pipelines.lock().expect("pipelines lock").remove(uri) {
            if let Some(task) = state.parse_task {
                task.abort();
            }
            if let Some(task) = state.diagnostics_task {
                task.abort();
            }
        }
        self.cache.remove(uri);
        self.sink.publish(uri, Vec::new());
        debug!(uri, "invalidated");
    }

    // ------------------------------------------------------------------
    // Generation bookkeeping
    // ------------------------------------------------------------------

    fn begin_parse(&self, uri: &str) -> u64 {
        let mut pipelines = self.pipelines.lock().expect("pipelines lock");
        let state = pipelines.entry(uri.to_string()).or_default();
        state.parse_generation += 1;
        if let Some(task) = state.parse_task.take() {
            task.abort();
        }
        state.parse_generation
    }

    fn begin_diagnostics(&self, uri: &str) -> u64 {
        let mut pipelines = self.pipelines.lock().expect("pipelines lock");
        let state = pipelines.entry(uri.to_string()).or_default();
        state.diagnostics_generation += 1;
        if let Some(task) = state.diagnostics_task.take() {
            task.abort();
        }
        state.diagnostics_generation
    }

    fn store_parse_task(&self, uri: &str, task: JoinHandle<()>) {
        let mut pipelines = self.pipelines.lock().expect("pipelines lock");
        if let Some(state) = pipelines.get_mut(uri) {
            state.parse_task = Some(task);
        } else {
            task.abort();
        }
    }

    fn store_diagnostics_task(&self, uri: &str, task: JoinHandle<()>) {
        let mut pipelines = self.pipelines.lock().expect("pipelines lock");
        if let Some(state) = pipelines.get_mut(uri) {
            state.diagnostics_task = Some(task);
        } else {
            task.abort();
        }
    }

    /// Publish a module if `generation` is still current for the URI.
    fn publish_module(&self, uri: &str, generation: u64, module: &Arc<Module>) -> bool {
        let pipelines = self.pipelines.lock().expect("pipelines lock");
        let current = pipelines
            .get(uri)
            .map(|state| state.parse_generation == generation)
            .unwrap_or(false);
        if current {
            self.cache.insert(uri, Arc::clone(module));
        }
        current
    }

    fn diagnostics_current(&self, uri: &str, generation: u64) -> bool {
        self.pipelines
            .lock()
            .expect("pipelines lock")
            .get(uri)
            .map(|state| state.diagnostics_generation == generation)
            .unwrap_or(false)
    }

    fn parse_current(&self, uri: &str, generation: u64) -> bool {
        self.pipelines
            .lock()
            .expect("pipelines lock")
            .get(uri)
            .map(|state| state.parse_generation == generation)
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Pipeline bodies (blocking threads)
    // ------------------------------------------------------------------

    fn run_parse(self: &Arc<Self>, uri: &str, text: &str, generation: u64) -> bool {
        // Identical text needs no gateway round-trip.
        if let Some(cached) = self.cache.get(uri) {
            if cached.source_hash == source_hash(text) {
                debug!(uri, "source unchanged, skipping reparse");
                return true;
            }
        }

        let Some(path) = uri::to_fs_path(uri) else {
            warn!(uri, "cannot derive a filesystem path, skipping parse");
            return false;
        };
        let default_version = self.default_version();
        let workspace_root = self.workspace_root.read().expect("root lock").clone();
        let request = ParseRequest {
            path: &path,
            source: Some(text),
            workspace_root: workspace_root.as_deref(),
            default_version: default_version.as_deref(),
        };

        let built = self.gateway.parse(&request).and_then(|parsed| {
            let ast = couleuvre_ast::inflate(&parsed.ast).map_err(|error| {
                GatewayError::Compiler {
                    message: error.to_string(),
                }
            })?;
            Ok(Arc::new(Module::build(ast, parsed.version, text)))
        });

        match built {
            Ok(module) => {
                if !self.publish_module(uri, generation, &module) {
                    debug!(uri, "parse result superseded, discarded");
                    return false;
                }
                {
                    let mut default = self.default_version.lock().expect("version lock");
                    if default.is_none() {
                        *default = Some(module.version.clone());
                    }
                }
                debug!(uri, version = %module.version, "module published");
                self.prefetch_imports(&module);
                true
            }
            Err(error) => {
                if !self.parse_current(uri, generation) {
                    return false;
                }
                warn!(uri, %error, "parse failed, keeping previous module");
                self.sink.publish(uri, vec![parse_failure_diagnostic(&error)]);
                false
            }
        }
    }

    fn run_diagnostics(&self, uri: &str, text: &str, generation: u64) {
        // No module means the AST parse failed; its diagnostic stands.
        let Some(module) = self.cache.get(uri) else {
            debug!(uri, "no module cached, skipping diagnostics");
            return;
        };
        let Some(path) = uri::to_fs_path(uri) else {
            return;
        };
        let workspace_root = self.workspace_root.read().expect("root lock").clone();
        let request = ParseRequest {
            path: &path,
            source: Some(text),
            workspace_root: workspace_root.as_deref(),
            default_version: Some(&module.version),
        };

        match self.gateway.compile(&request) {
            Ok(diagnostics) => {
                if self.diagnostics_current(uri, generation) {
                    debug!(uri, count = diagnostics.len(), "diagnostics published");
                    self.sink.publish(uri, diagnostics);
                } else {
                    debug!(uri, "diagnostics superseded, discarded");
                }
            }
            Err(error) => {
                // Keep whatever diagnostics are showing; the fast
                // pipeline already reported parse-stage problems.
                warn!(uri, %error, "diagnostics run failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Import prefetch
    // ------------------------------------------------------------------

    fn prefetch_imports(self: &Arc<Self>, module: &Module) {
        for path in module.imports.values() {
            let Some(import_uri) = uri::from_fs_path(path) else {
                continue;
            };
            if self.cache.contains(&import_uri) {
                continue;
            }
            {
                let mut inflight = self.prefetching.lock().expect("prefetch lock");
                if !inflight.insert(import_uri.clone()) {
                    continue;
                }
            }
            let this = Arc::clone(self);
            let path = path.clone();
            self.runtime.spawn(async move {
                tokio::time::sleep(this.config.prefetch_delay).await;
                let worker = Arc::clone(&this);
                let worker_uri = import_uri.clone();
                let _ = tokio::task::spawn_blocking(move || {
                    worker.parse_import(&worker_uri, &path);
                })
                .await;
                this.prefetching
                    .lock()
                    .expect("prefetch lock")
                    .remove(&import_uri);
            });
        }
    }

    /// Parse an import target from disk, best effort.
    fn parse_import(self: &Arc<Self>, uri: &str, path: &std::path::Path) {
        if self.cache.contains(uri) {
            return;
        }
        let default_version = self.default_version();
        let workspace_root = self.workspace_root.read().expect("root lock").clone();
        let request = ParseRequest {
            path,
            source: None,
            workspace_root: workspace_root.as_deref(),
            default_version: default_version.as_deref(),
        };

        let built = self.gateway.parse(&request).and_then(|parsed| {
            let ast = couleuvre_ast::inflate(&parsed.ast).map_err(|error| {
                GatewayError::Compiler {
                    message: error.to_string(),
                }
            })?;
            let source = std::fs::read_to_string(path).unwrap_or_default();
            Ok(Arc::new(Module::build(ast, parsed.version, &source)))
        });

        match built {
            Ok(module) => {
                self.cache.insert_if_absent(uri, Arc::clone(&module));
                debug!(uri, "import cached");
                self.prefetch_imports(&module);
            }
            Err(error) => {
                // Imports need not be independently valid.
                debug!(uri, %error, "import parse failed, swallowed");
            }
        }
    }
}

/// The single diagnostic published when the fast pipeline fails.
fn parse_failure_diagnostic(error: &GatewayError) -> Diagnostic {
    let mut message = error.to_string();
    if error.is_version_error() {
        message = format!(
            "{}. Add '#pragma version ^0.4.0' at the top of the file.",
            message
        );
    }
    let location = parse_error_location(&message);
    create_diagnostic(
        message,
        location,
        None,
        DiagnosticSeverity::Error,
        "couleuvre",
    )
}
