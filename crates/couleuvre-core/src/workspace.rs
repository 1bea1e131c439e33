//! Workspace source-file discovery.
//!
//! Cross-module reference search may widen its candidate set to on-disk
//! source files under the workspace root. Parsing every file through the
//! compiler gateway is far too slow for that, so candidates are first
//! text-prefiltered: a file that does not even contain the symbol's bare
//! name as a substring cannot reference it and is rejected without a
//! parse.
//!
//! Discovery is advisory: an unreadable root or file simply contributes
//! nothing, and single-file correctness never depends on this module.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

/// Glob patterns for source files this server analyzes.
const SOURCE_GLOBS: &[&str] = &["**/*.vy", "**/*.vyi"];

fn source_matcher() -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in SOURCE_GLOBS {
        builder.add(Glob::new(pattern).expect("valid source glob"));
    }
    builder.build().expect("valid source glob set")
}

/// List all source files under the workspace root.
///
/// Results are sorted by path for deterministic iteration. Errors while
/// walking (permission failures, dangling links) are skipped.
pub fn source_files(root: &Path) -> Vec<PathBuf> {
    let matcher = source_matcher();
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.strip_prefix(root)
                .map(|rel| matcher.is_match(rel))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Find source files under `root` containing any of `terms` as a substring.
///
/// `exclude` holds canonical paths that have already been searched (open
/// documents); they are skipped so they are not searched twice.
pub fn files_containing(
    root: &Path,
    terms: &[String],
    exclude: &HashSet<PathBuf>,
) -> Vec<PathBuf> {
    if terms.is_empty() || !root.exists() {
        return Vec::new();
    }

    let mut matching = Vec::new();
    for path in source_files(root) {
        let canonical = crate::uri::canonical_path(&path);
        if exclude.contains(&canonical) {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                if terms.iter().any(|term| content.contains(term.as_str())) {
                    matching.push(path);
                }
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping unreadable file");
            }
        }
    }
    matching
}
