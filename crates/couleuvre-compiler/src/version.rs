//! Compiler version detection.
//!
//! Sources declare their compiler with a comment pragma
//! (`# pragma version ^0.4.0` or the older `# @version 0.3.10`); the
//! first such marker wins. When a file has none, the gateway falls back
//! to the server's default version (usually whatever is installed).
//!
//! Version ordering here is deliberately minimal: the gateway only ever
//! compares against two fixed thresholds that changed the script shape
//! (0.4.0 for diagnostics, 0.4.1 for AST extraction).

use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Matches a version pragma comment and captures the version number.
static VERSION_PRAGMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\s*(?:@version|pragma\s+version)\s*(?:[<>=!~^]*)\s*(\d+\.\d+\.\d+)")
        .expect("valid regex")
});

/// Matches the leading version number of `vyper --version` output.
static VERSION_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+)").expect("valid regex"));

/// Extract the declared compiler version from source text.
pub fn extract_version(source: &str) -> Option<String> {
    VERSION_PRAGMA
        .captures(source)
        .map(|caps| caps[1].to_string())
}

/// The version of the `vyper` executable on PATH, if any.
pub fn installed_vyper_version() -> Option<String> {
    let vyper = which::which("vyper").ok()?;
    let output = Command::new(vyper).arg("--version").output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let version = VERSION_OUTPUT.captures(&text).map(|caps| caps[1].to_string());
    debug!(?version, "detected installed compiler");
    version
}

/// Parse `major.minor.patch` into a comparable triple.
fn parse(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    // The patch component may carry a suffix like `1b2`; take the
    // leading digits.
    let patch_text = parts.next()?;
    let digits: String = patch_text.chars().take_while(char::is_ascii_digit).collect();
    let patch = digits.parse().ok()?;
    Some((major, minor, patch))
}

/// Whether `version` is at least `minimum`.
///
/// Unparseable versions count as modern: the newer script shapes are the
/// safer default.
pub fn at_least(version: &str, minimum: (u32, u32, u32)) -> bool {
    match parse(version) {
        Some(triple) => triple >= minimum,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod pragma_extraction {
        use super::*;

        #[test]
        fn modern_pragma_form() {
            assert_eq!(
                extract_version("# pragma version ^0.4.0\nx: uint256"),
                Some("0.4.0".to_string())
            );
        }

        #[test]
        fn legacy_at_version_form() {
            assert_eq!(
                extract_version("# @version 0.3.10\n"),
                Some("0.3.10".to_string())
            );
        }

        #[test]
        fn comparison_operators_are_skipped() {
            assert_eq!(
                extract_version("#pragma version >=0.4.1\n"),
                Some("0.4.1".to_string())
            );
            assert_eq!(
                extract_version("# @version ~0.3.7"),
                Some("0.3.7".to_string())
            );
        }

        #[test]
        fn missing_pragma_is_none() {
            assert_eq!(extract_version("x: uint256\n"), None);
        }

        #[test]
        fn first_marker_wins() {
            let source = "# pragma version 0.4.0\n# pragma version 0.3.10\n";
            assert_eq!(extract_version(source), Some("0.4.0".to_string()));
        }

        #[test]
        fn pragma_not_at_start_of_file_still_counts() {
            let source = "\n\n# some header\n# pragma version 0.4.1\n";
            assert_eq!(extract_version(source), Some("0.4.1".to_string()));
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn threshold_comparisons() {
            assert!(at_least("0.4.1", (0, 4, 1)));
            assert!(at_least("0.4.2", (0, 4, 1)));
            assert!(at_least("1.0.0", (0, 4, 1)));
            assert!(!at_least("0.4.0", (0, 4, 1)));
            assert!(!at_least("0.3.10", (0, 4, 0)));
        }

        #[test]
        fn numeric_not_lexicographic() {
            // 0.3.10 > 0.3.9 numerically, though not as a string.
            assert!(at_least("0.3.10", (0, 3, 9)));
        }

        #[test]
        fn unparseable_counts_as_modern() {
            assert!(at_least("garbage", (0, 4, 1)));
        }
    }
}
