//! Gateway error taxonomy.

use thiserror::Error;

/// Failures of the compiler gateway.
///
/// Semantic errors found by the compiler are *not* errors here — the
/// diagnostics pipeline returns them as data. These variants cover the
/// cases where the gateway could not produce a usable answer at all.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The source carries no version pragma and no default version is
    /// known.
    #[error("no version pragma found in {path} and no default version available")]
    VersionNotFound { path: String },

    /// The compiler rejected the source at the AST stage, or the
    /// subprocess failed outright.
    #[error("compiler error: {message}")]
    Compiler { message: String },

    /// The compiler subprocess exceeded the configured timeout.
    #[error("compiler timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Launching or talking to the subprocess failed.
    #[error("compiler subprocess I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The subprocess printed something that is not the expected JSON.
    #[error("failed to decode compiler output: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Whether this error stems from a missing version marker.
    pub fn is_version_error(&self) -> bool {
        matches!(self, GatewayError::VersionNotFound { .. })
    }
}
