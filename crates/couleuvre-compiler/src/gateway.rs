//! The gateway trait and its subprocess implementation.
//!
//! Script shapes changed across compiler generations:
//! - AST extraction: before 0.4.1 the source is compiled directly; from
//!   0.4.1 on it goes through a filesystem input bundle so imports
//!   resolve, and import resolution failures are swallowed (navigation
//!   still works on the unresolved tree).
//! - Diagnostics: before 0.4.0 a full `compile_code`; from 0.4.0 on the
//!   pipeline stops at the annotated AST, which runs semantic analysis
//!   without code generation.
//!
//! Unsaved buffers need a real file for the bundle-based scripts; a
//! scratch file is created next to the document so relative imports
//! still resolve, and its name is rewritten back to the document's in
//! any message the user sees.

use std::path::Path;
use std::time::Duration;

use couleuvre_core::protocol::Diagnostic;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::diagnostics::decode_compile_output;
use crate::env::VyperEnvironment;
use crate::error::GatewayError;
use crate::version;

// ============================================================================
// Requests and results
// ============================================================================

/// One parse or compile request.
#[derive(Debug, Clone, Copy)]
pub struct ParseRequest<'a> {
    /// Path of the document on disk.
    pub path: &'a Path,
    /// Unsaved buffer contents, when the editor's copy is newer than
    /// the file.
    pub source: Option<&'a str>,
    /// Workspace root, used as the subprocess working directory.
    pub workspace_root: Option<&'a Path>,
    /// Version to assume when the source has no pragma.
    pub default_version: Option<&'a str>,
}

/// A successful AST extraction.
#[derive(Debug)]
pub struct ParsedSource {
    /// The version the source was parsed with.
    pub version: String,
    /// The compiler's JSON syntax tree.
    pub ast: Value,
}

/// The compiler collaborator, at the seam the scheduler works against.
pub trait CompilerGateway: Send + Sync {
    /// Extract the JSON AST (fast path, feeds navigation).
    fn parse(&self, request: &ParseRequest<'_>) -> Result<ParsedSource, GatewayError>;

    /// Run semantic analysis and return diagnostics (slow path).
    ///
    /// Semantic failures are data in the returned list; only
    /// infrastructure failures are `Err`.
    fn compile(&self, request: &ParseRequest<'_>) -> Result<Vec<Diagnostic>, GatewayError>;
}

// ============================================================================
// Subprocess implementation
// ============================================================================

/// Gateway that shells out to a Python interpreter.
#[derive(Debug, Clone)]
pub struct SubprocessGateway {
    timeout: Duration,
}

impl Default for SubprocessGateway {
    fn default() -> Self {
        SubprocessGateway {
            timeout: Duration::from_secs(30),
        }
    }
}

impl SubprocessGateway {
    /// Create a gateway with the default timeout.
    pub fn new() -> Self {
        SubprocessGateway::default()
    }

    /// Create a gateway with a custom subprocess timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        SubprocessGateway { timeout }
    }

    fn resolve_version(&self, request: &ParseRequest<'_>, source: &str) -> Result<String, GatewayError> {
        if let Some(version) = version::extract_version(source) {
            return Ok(version);
        }
        if let Some(default) = request.default_version {
            return Ok(default.to_string());
        }
        Err(GatewayError::VersionNotFound {
            path: request.path.display().to_string(),
        })
    }

    fn read_source(&self, request: &ParseRequest<'_>) -> Result<String, GatewayError> {
        match request.source {
            Some(source) => Ok(source.to_string()),
            None => Ok(std::fs::read_to_string(request.path)?),
        }
    }
}

impl CompilerGateway for SubprocessGateway {
    fn parse(&self, request: &ParseRequest<'_>) -> Result<ParsedSource, GatewayError> {
        let source = self.read_source(request)?;
        let parsed_version = self.resolve_version(request, &source)?;
        let environment = VyperEnvironment::resolve(&parsed_version);
        let search_paths = environment.search_paths();

        let scratch = ScratchFile::for_request(request, &source, &parsed_version, (0, 4, 1))?;
        let script = ast_script(
            scratch.effective_path(request.path),
            &parsed_version,
            &search_paths,
            &source,
        );

        let output = environment.run_script(&script, request.workspace_root, self.timeout)?;
        if !output.success() {
            let message = scratch.sanitize(request.path, output.stderr.trim());
            let message = if message.is_empty() {
                "Unknown error".to_string()
            } else {
                message
            };
            warn!(path = %request.path.display(), "AST extraction failed");
            return Err(GatewayError::Compiler { message });
        }

        let ast: Value = serde_json::from_str(&output.stdout)?;
        info!(path = %request.path.display(), version = %parsed_version, "extracted AST");
        Ok(ParsedSource {
            version: parsed_version,
            ast,
        })
    }

    fn compile(&self, request: &ParseRequest<'_>) -> Result<Vec<Diagnostic>, GatewayError> {
        let source = self.read_source(request)?;
        let parsed_version = self.resolve_version(request, &source)?;
        let environment = VyperEnvironment::resolve(&parsed_version);
        let search_paths = environment.search_paths();

        let scratch = ScratchFile::for_request(request, &source, &parsed_version, (0, 4, 0))?;
        let script = diagnostics_script(
            scratch.effective_path(request.path),
            &parsed_version,
            &search_paths,
            &source,
        );

        let output = environment.run_script(&script, request.workspace_root, self.timeout)?;
        debug!(path = %request.path.display(), "diagnostics script finished");
        let sanitize = |text: &str| scratch.sanitize(request.path, text);
        Ok(decode_compile_output(&output.stdout, &output.stderr, &sanitize))
    }
}

// ============================================================================
// Scratch files for unsaved buffers
// ============================================================================

/// A temporary on-disk copy of an unsaved buffer.
///
/// Created next to the real document so relative imports resolve the
/// same way; deleted on drop.
struct ScratchFile {
    file: Option<tempfile::NamedTempFile>,
}

impl ScratchFile {
    /// Create a scratch file when the request carries unsaved source
    /// and the script shape for this version reads from disk.
    fn for_request(
        request: &ParseRequest<'_>,
        source: &str,
        parsed_version: &str,
        disk_threshold: (u32, u32, u32),
    ) -> Result<ScratchFile, GatewayError> {
        if request.source.is_none() || !version::at_least(parsed_version, disk_threshold) {
            return Ok(ScratchFile { file: None });
        }
        let directory = request.path.parent().unwrap_or_else(|| Path::new("."));
        let suffix = request
            .path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| ".vy".to_string());
        let mut file = tempfile::Builder::new()
            .prefix(".couleuvre-")
            .suffix(&suffix)
            .tempfile_in(directory)?;
        std::io::Write::write_all(&mut file, source.as_bytes())?;
        Ok(ScratchFile { file: Some(file) })
    }

    /// The path the script should read.
    fn effective_path<'a>(&'a self, document: &'a Path) -> &'a Path {
        self.file
            .as_ref()
            .map(|file| file.path())
            .unwrap_or(document)
    }

    /// Replace the scratch file name with the document name in a
    /// message.
    fn sanitize(&self, document: &Path, message: &str) -> String {
        let Some(file) = &self.file else {
            return message.to_string();
        };
        let scratch_name = file
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let document_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if scratch_name.is_empty() {
            message.to_string()
        } else {
            message.replace(&scratch_name, &document_name)
        }
    }
}

// ============================================================================
// Generated scripts
// ============================================================================

fn json_paths(paths: &[String]) -> String {
    serde_json::to_string(paths).unwrap_or_else(|_| "[]".to_string())
}

fn json_str(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

/// The AST-extraction script for a version.
fn ast_script(path: &Path, parsed_version: &str, search_paths: &[String], source: &str) -> String {
    if !version::at_least(parsed_version, (0, 4, 1)) {
        return format!(
            r#"
import json
from vyper.compiler import CompilerData

data = CompilerData({source}).vyper_module
print(json.dumps(data.to_dict()))
"#,
            source = json_str(source),
        );
    }

    format!(
        r#"
import json
from pathlib import Path
from vyper.compiler import CompilerData
from vyper.compiler.input_bundle import FilesystemInputBundle
from vyper.semantics.analysis.imports import resolve_imports

search_paths = [Path(p) for p in {search_paths}]
input_bundle = FilesystemInputBundle(search_paths)
file = input_bundle.load_file({path})
module = CompilerData(file, input_bundle).vyper_module
try:
    with input_bundle.search_path(Path(module.resolved_path).parent):
        resolve_imports(module, input_bundle)
except Exception:
    pass
print(json.dumps(module.to_dict()))
"#,
        search_paths = json_paths(search_paths),
        path = json_str(&path.to_string_lossy()),
    )
}

/// The semantic-diagnostics script for a version.
fn diagnostics_script(
    path: &Path,
    parsed_version: &str,
    search_paths: &[String],
    source: &str,
) -> String {
    let error_reporting = r#"
    error_info = {
        "success": False,
        "error_type": type(e).__name__,
        "message": str(e),
        "traceback": traceback.format_exc(),
    }
    if hasattr(e, "annotations") and e.annotations:
        node = e.annotations[0]
        if hasattr(node, "lineno"):
            error_info["lineno"] = node.lineno
            error_info["col_offset"] = getattr(node, "col_offset", 0)
            error_info["end_lineno"] = getattr(node, "end_lineno", node.lineno)
            error_info["end_col_offset"] = getattr(
                node, "end_col_offset", error_info["col_offset"] + 1
            )
    print(json.dumps(error_info))
"#;

    if !version::at_least(parsed_version, (0, 4, 0)) {
        return format!(
            r#"
import json
import traceback

try:
    from vyper import compile_code
    compile_code({source})
    print(json.dumps({{"success": True}}))
except Exception as e:{error_reporting}"#,
            source = json_str(source),
            error_reporting = error_reporting,
        );
    }

    format!(
        r#"
import json
import traceback
from pathlib import Path

try:
    from vyper.compiler import CompilerData
    from vyper.compiler.input_bundle import FilesystemInputBundle

    search_paths = [Path(p) for p in {search_paths}]
    input_bundle = FilesystemInputBundle(search_paths)
    file = input_bundle.load_file({path})
    compiler_data = CompilerData(file, input_bundle)
    _ = compiler_data.annotated_vyper_module
    print(json.dumps({{"success": True}}))
except Exception as e:{error_reporting}"#,
        search_paths = json_paths(search_paths),
        path = json_str(&path.to_string_lossy()),
        error_reporting = error_reporting,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    mod version_resolution {
        use super::*;

        #[test]
        fn pragma_beats_default() {
            let gateway = SubprocessGateway::new();
            let request = ParseRequest {
                path: Path::new("/ws/a.vy"),
                source: None,
                workspace_root: None,
                default_version: Some("0.3.10"),
            };
            let version = gateway
                .resolve_version(&request, "# pragma version 0.4.1\n")
                .unwrap();
            assert_eq!(version, "0.4.1");
        }

        #[test]
        fn default_fills_missing_pragma() {
            let gateway = SubprocessGateway::new();
            let request = ParseRequest {
                path: Path::new("/ws/a.vy"),
                source: None,
                workspace_root: None,
                default_version: Some("0.3.10"),
            };
            let version = gateway.resolve_version(&request, "x: uint256\n").unwrap();
            assert_eq!(version, "0.3.10");
        }

        #[test]
        fn no_pragma_and_no_default_is_version_not_found() {
            let gateway = SubprocessGateway::new();
            let request = ParseRequest {
                path: Path::new("/ws/a.vy"),
                source: None,
                workspace_root: None,
                default_version: None,
            };
            let error = gateway.resolve_version(&request, "x: uint256\n").unwrap_err();
            assert!(error.is_version_error());
        }
    }

    mod scripts {
        use super::*;

        #[test]
        fn old_versions_embed_the_source() {
            let script = ast_script(Path::new("/ws/a.vy"), "0.3.10", &[], "x: uint256\n");
            assert!(script.contains("CompilerData(\"x: uint256\\n\")"));
            assert!(!script.contains("FilesystemInputBundle"));
        }

        #[test]
        fn modern_versions_load_through_the_bundle() {
            let paths = vec![".".to_string()];
            let script = ast_script(Path::new("/ws/a.vy"), "0.4.1", &paths, "");
            assert!(script.contains("FilesystemInputBundle"));
            assert!(script.contains(r#""/ws/a.vy""#));
            assert!(script.contains("resolve_imports"));
        }

        #[test]
        fn diagnostics_script_switches_at_0_4_0() {
            let old = diagnostics_script(Path::new("/ws/a.vy"), "0.3.10", &[], "pass");
            assert!(old.contains("compile_code"));
            let new = diagnostics_script(Path::new("/ws/a.vy"), "0.4.0", &[], "pass");
            assert!(new.contains("annotated_vyper_module"));
        }

        #[test]
        fn source_is_json_escaped() {
            let script = ast_script(
                Path::new("/ws/a.vy"),
                "0.3.10",
                &[],
                "s: String[10] = \"hi\"\n",
            );
            assert!(script.contains(r#"\"hi\""#));
        }
    }

    mod scratch_files {
        use super::*;

        #[test]
        fn saved_documents_use_their_own_path() {
            let request = ParseRequest {
                path: Path::new("/ws/a.vy"),
                source: None,
                workspace_root: None,
                default_version: None,
            };
            let scratch = ScratchFile::for_request(&request, "", "0.4.1", (0, 4, 1)).unwrap();
            assert_eq!(scratch.effective_path(request.path), request.path);
        }

        #[test]
        fn old_versions_never_need_a_scratch_file() {
            let request = ParseRequest {
                path: Path::new("/ws/a.vy"),
                source: Some("x: uint256"),
                workspace_root: None,
                default_version: None,
            };
            let scratch = ScratchFile::for_request(&request, "x: uint256", "0.3.10", (0, 4, 1)).unwrap();
            assert!(scratch.file.is_none());
        }

        #[test]
        fn unsaved_buffers_get_a_sibling_scratch_file() {
            let dir = tempfile::TempDir::new().unwrap();
            let document = dir.path().join("token.vy");
            std::fs::write(&document, "old contents").unwrap();
            let request = ParseRequest {
                path: &document,
                source: Some("new contents"),
                workspace_root: None,
                default_version: None,
            };
            let scratch =
                ScratchFile::for_request(&request, "new contents", "0.4.1", (0, 4, 1)).unwrap();
            let effective = scratch.effective_path(&document).to_path_buf();
            assert_ne!(effective, document);
            assert_eq!(effective.parent(), document.parent());
            assert_eq!(std::fs::read_to_string(&effective).unwrap(), "new contents");
            // Messages mentioning the scratch name read as the document.
            let scratch_name = effective.file_name().unwrap().to_string_lossy().into_owned();
            let sanitized = scratch.sanitize(&document, &format!("error in {}", scratch_name));
            assert_eq!(sanitized, "error in token.vy");
        }
    }
}
