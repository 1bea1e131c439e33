//! Decoding compiler failures into diagnostics.
//!
//! The diagnostics script prints one JSON object: `{"success": true}` or
//! an error record carrying the exception type, message, traceback, and
//! (when the compiler attached source annotations) an exact location.
//! Everything here turns that record, or a raw stderr dump, into editor
//! diagnostics.

use std::sync::LazyLock;

use couleuvre_core::protocol::{Diagnostic, DiagnosticSeverity, Position, Range};
use regex::Regex;
use serde_json::Value;

/// Matches `line 6:17` in compiler error messages.
static ERROR_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"line\s+(\d+):(\d+)").expect("valid regex"));

/// Matches the exception type in a traceback
/// (`vyper.exceptions.TypeMismatch`).
static ERROR_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vyper\.exceptions\.(\w+)").expect("valid regex"));

/// Extract a 0-based (line, column) from an error message.
///
/// The compiler prints 1-based lines and 0-based columns; absent
/// locations default to the start of the file.
pub fn parse_error_location(message: &str) -> (u32, u32) {
    if let Some(caps) = ERROR_LOCATION.captures(message) {
        let line: u32 = caps[1].parse().unwrap_or(1);
        let col: u32 = caps[2].parse().unwrap_or(0);
        return (line.saturating_sub(1), col);
    }
    (0, 0)
}

/// Extract the compiler exception type from a traceback.
fn parse_error_type(traceback: &str) -> Option<String> {
    ERROR_TYPE
        .captures(traceback)
        .map(|caps| caps[1].to_string())
}

/// Severity for a compiler exception type.
fn severity_for(error_type: Option<&str>) -> DiagnosticSeverity {
    match error_type {
        Some("DeprecationWarning") | Some("SyntaxWarning") => DiagnosticSeverity::Warning,
        _ => DiagnosticSeverity::Error,
    }
}

/// Build a diagnostic at a 0-based location.
///
/// The end defaults to one character past the start, which is how the
/// compiler's single-point locations render best.
pub fn create_diagnostic(
    message: impl Into<String>,
    start: (u32, u32),
    end: Option<(u32, u32)>,
    severity: DiagnosticSeverity,
    source: &str,
) -> Diagnostic {
    let end = end.unwrap_or((start.0, start.1 + 1));
    Diagnostic {
        range: Range::new(
            Position::new(start.0, start.1),
            Position::new(end.0, end.1),
        ),
        severity: Some(severity),
        message: message.into(),
        source: Some(source.to_string()),
    }
}

/// Decode the diagnostics script's output.
///
/// `sanitize` rewrites scratch-file names back to the real document name
/// in user-visible messages.
pub fn decode_compile_output(
    stdout: &str,
    stderr: &str,
    sanitize: &dyn Fn(&str) -> String,
) -> Vec<Diagnostic> {
    let Ok(output) = serde_json::from_str::<Value>(stdout) else {
        // No JSON at all: surface stderr as a single diagnostic.
        let stderr = stderr.trim();
        if stderr.is_empty() {
            return Vec::new();
        }
        let message = sanitize(stderr);
        let location = parse_error_location(&message);
        return vec![create_diagnostic(
            message,
            location,
            None,
            DiagnosticSeverity::Error,
            "vyper",
        )];
    };

    if output.get("success").and_then(Value::as_bool) == Some(true) {
        return Vec::new();
    }

    let message = sanitize(
        output
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown compilation error"),
    );
    let traceback = sanitize(
        output
            .get("traceback")
            .and_then(Value::as_str)
            .unwrap_or(""),
    );

    let mut error_type = output
        .get("error_type")
        .and_then(Value::as_str)
        .map(str::to_string);
    if error_type.as_deref().is_none_or(|t| t == "Exception") {
        if let Some(parsed) = parse_error_type(&traceback) {
            error_type = Some(parsed);
        }
    }

    // Prefer the structured location the compiler attached to the
    // exception; fall back to scraping the message, then the traceback.
    let (start, end) = if let Some(lineno) = output.get("lineno").and_then(Value::as_u64) {
        let get = |key: &str| output.get(key).and_then(Value::as_u64);
        let start_line = (lineno as u32).saturating_sub(1);
        let start_col = get("col_offset").unwrap_or(0) as u32;
        let end_line = (get("end_lineno").unwrap_or(lineno) as u32).saturating_sub(1);
        let end_col = get("end_col_offset").unwrap_or(u64::from(start_col) + 1) as u32;
        ((start_line, start_col), Some((end_line, end_col)))
    } else {
        let mut location = parse_error_location(&message);
        if location == (0, 0) {
            location = parse_error_location(&traceback);
        }
        (location, None)
    };

    let severity = severity_for(error_type.as_deref());
    let formatted = match &error_type {
        Some(error_type) => format!("[{}] {}", error_type, message),
        None => message,
    };

    vec![create_diagnostic(formatted, start, end, severity, "vyper")]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(text: &str) -> String {
        text.to_string()
    }

    mod locations {
        use super::*;

        #[test]
        fn parses_line_col_form() {
            assert_eq!(parse_error_location("error on line 6:17 somewhere"), (5, 17));
        }

        #[test]
        fn missing_location_defaults_to_start() {
            assert_eq!(parse_error_location("something went wrong"), (0, 0));
        }
    }

    mod decoding {
        use super::*;

        #[test]
        fn success_yields_no_diagnostics() {
            let diags = decode_compile_output(r#"{"success": true}"#, "", &identity);
            assert!(diags.is_empty());
        }

        #[test]
        fn structured_location_is_preferred() {
            let stdout = r#"{
                "success": false,
                "error_type": "TypeMismatch",
                "message": "Given reference has type uint256",
                "traceback": "",
                "lineno": 7,
                "col_offset": 4,
                "end_lineno": 7,
                "end_col_offset": 16
            }"#;
            let diags = decode_compile_output(stdout, "", &identity);
            assert_eq!(diags.len(), 1);
            let diag = &diags[0];
            assert_eq!(diag.range.start, Position::new(6, 4));
            assert_eq!(diag.range.end, Position::new(6, 16));
            assert_eq!(diag.severity, Some(DiagnosticSeverity::Error));
            assert!(diag.message.starts_with("[TypeMismatch]"));
        }

        #[test]
        fn error_type_recovered_from_traceback() {
            let stdout = r#"{
                "success": false,
                "error_type": "Exception",
                "message": "line 3:0 bad",
                "traceback": "...\nvyper.exceptions.UndeclaredDefinition: bad\n"
            }"#;
            let diags = decode_compile_output(stdout, "", &identity);
            assert!(diags[0].message.starts_with("[UndeclaredDefinition]"));
            assert_eq!(diags[0].range.start, Position::new(2, 0));
        }

        #[test]
        fn warnings_map_to_warning_severity() {
            let stdout = r#"{
                "success": false,
                "error_type": "DeprecationWarning",
                "message": "deprecated",
                "traceback": ""
            }"#;
            let diags = decode_compile_output(stdout, "", &identity);
            assert_eq!(diags[0].severity, Some(DiagnosticSeverity::Warning));
        }

        #[test]
        fn non_json_output_falls_back_to_stderr() {
            let diags =
                decode_compile_output("", "Traceback: boom at line 2:5\n", &identity);
            assert_eq!(diags.len(), 1);
            assert_eq!(diags[0].range.start, Position::new(1, 5));
        }

        #[test]
        fn empty_output_yields_nothing() {
            assert!(decode_compile_output("", "", &identity).is_empty());
        }

        #[test]
        fn sanitizer_rewrites_messages() {
            let sanitize = |text: &str| text.replace("tmp123.vy", "token.vy");
            let stdout = r#"{
                "success": false,
                "message": "error in tmp123.vy",
                "traceback": ""
            }"#;
            let diags = decode_compile_output(stdout, "", &sanitize);
            assert!(diags[0].message.contains("token.vy"));
            assert!(!diags[0].message.contains("tmp123"));
        }
    }
}
