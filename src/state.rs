//! Persisted extension state.
//!
//! The enabled flag, the registered contributions and the notification
//! timestamps used for debouncing survive between runs in a small JSON
//! record. The record is loaded once, handed to the reconciler, and saved
//! back explicitly; nothing else reads or writes it.

use crate::error::{Error, Result};
use crate::remediation::Remediation;
use crate::shim::write_if_changed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The persisted state record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionState {
    /// Whether the user asked for the patch to be active.
    #[serde(default)]
    pub enabled: bool,

    /// Raw contribution payloads keyed by source identity.
    #[serde(default)]
    pub contributions: BTreeMap<String, serde_json::Value>,

    /// Last time (unix milliseconds) each remediation was surfaced.
    #[serde(default)]
    pub last_notified: BTreeMap<Remediation, u64>,
}

/// Loads and saves [`ExtensionState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, or the default record when none has been saved yet.
    pub fn load(&self) -> Result<ExtensionState> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ExtensionState::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&text).map_err(|e| Error::State {
            message: format!("cannot parse {}: {}", self.path.display(), e),
        })
    }

    /// Save the record. Returns whether the file content changed.
    pub fn save(&self, state: &ExtensionState) -> Result<bool> {
        let mut text = serde_json::to_string_pretty(state)?;
        text.push('\n');
        write_if_changed(&self.path, &text)
    }
}
