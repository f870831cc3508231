//! # Error Handling
//!
//! This module defines the centralized error type for `monkey-patch`. It uses
//! `thiserror` to build a single `Error` enum that covers every failure mode
//! of the patch engine, with contextual fields so the CLI can explain what
//! went wrong and what to do next.
//!
//! ## Taxonomy
//!
//! - **`PermissionDenied`**: the installation directory is not writable by the
//!   current user. The reconciler treats this as a signal to elevate, not as a
//!   final failure.
//! - **`ElevationDenied`**: the user declined (or could not answer) the
//!   operating system's privilege prompt.
//! - **`TransactionFailed`**: the patch script exited with a nonzero status or
//!   could not be spawned. Captured output is attached. There is no rollback,
//!   so the installation may be partially patched; `uninstall` is the
//!   recovery path.
//! - **`TemplateSourceMissing`**: a template that a render step needs is
//!   absent.
//! - **`InjectionPointMissing`**: the host document has no line to insert
//!   the UI shim before, so a patched copy would load nothing extra.
//! - **`ManifestEntryInvalid`**: one configured or contributed entry is
//!   malformed. These are normally collected as diagnostics and the entry is
//!   dropped; the rest of the manifest is still honored.
//!
//! The remaining variants cover configuration parsing, persisted state, and
//! wrapped I/O and serialization errors.

use thiserror::Error;

/// Main error type for monkey-patch operations
#[derive(Error, Debug)]
pub enum Error {
    /// The writability probe failed for a protected directory.
    #[error("Permission denied for {path}: {reason}")]
    PermissionDenied { path: String, reason: String },

    /// The privilege prompt was dismissed or refused.
    #[error("Elevation denied: {message}")]
    ElevationDenied { message: String },

    /// The patch script failed or could not be started.
    ///
    /// `code` is `None` when the process was never spawned or was killed by a
    /// signal.
    #[error("Patch transaction failed (exit code {}): {}", code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()), summarize(stdout, stderr))]
    TransactionFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// A template file required by a render operation does not exist.
    #[error("Template source missing: {path}")]
    TemplateSourceMissing { path: String },

    /// The host document lacks the tag the UI shim is inserted before.
    #[error("Cannot patch {path}: no `{tag}` line to insert the UI shim before")]
    InjectionPointMissing { path: String, tag: String },

    /// A single manifest entry from settings or a contribution is malformed.
    #[error("Invalid manifest entry in {source_name} ({entry}): {message}")]
    ManifestEntryInvalid {
        /// Where the entry came from (`settings` or a contribution source id).
        source_name: String,
        /// The offending key or list position.
        entry: String,
        message: String,
    },

    /// An error occurred while parsing the settings file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The persisted state record could not be read or written.
    #[error("State error: {message}")]
    State { message: String },

    /// A filesystem operation outside the patch script failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

fn summarize(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = stdout.trim();
    if stdout.is_empty() {
        "no output".to_string()
    } else {
        stdout.to_string()
    }
}
