//! `file://` URI conversion.
//!
//! Documents arrive from the editor addressed by URI and leave as URIs in
//! locations; the compiler gateway and workspace scanning work on
//! filesystem paths. These helpers convert between the two and provide the
//! canonical-path normalization used to decide whether two URIs denote the
//! same file.

use std::path::{Path, PathBuf};

/// Characters that pass through a URI path segment unescaped.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/')
}

/// Convert a filesystem path to a `file://` URI.
///
/// Returns `None` for relative paths; URIs must be absolute.
pub fn from_fs_path(path: &Path) -> Option<String> {
    if !path.is_absolute() {
        return None;
    }
    let mut uri = String::from("file://");
    for &byte in path.to_string_lossy().as_bytes() {
        if is_unreserved(byte) {
            uri.push(byte as char);
        } else {
            uri.push_str(&format!("%{:02X}", byte));
        }
    }
    Some(uri)
}

/// Convert a `file://` URI back to a filesystem path.
///
/// Returns `None` for non-file URIs or malformed percent escapes.
pub fn to_fs_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    // An authority component (file://host/...) is not supported; local
    // URIs have an empty authority and the path starts immediately.
    let bytes = rest.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let value = u8::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?;
            decoded.push(value);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    let path = String::from_utf8(decoded).ok()?;
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Normalize a path to a resolved absolute form for identity comparison.
///
/// Falls back to the path as given when it cannot be resolved (for
/// example, a file that no longer exists on disk).
pub fn canonical_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
