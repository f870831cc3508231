//! # Settings File Schema and Parsing
//!
//! This module defines the user settings file (`settings.yaml`) and the logic
//! for loading it. Settings come in two flavours:
//!
//! - **Typed keys** that steer the tool itself: where the host application is
//!   installed, where generated artifacts and state live, where contribution
//!   sources are resolved, and the notification debounce window.
//!
//! - **Raw manifest keys** (`folderMap`, `mainProcessModules`,
//!   `browserModules`) that are kept as untyped YAML values. They are validated
//!   entry by entry in [`crate::manifest`], so one malformed entry never
//!   prevents the rest of the file from being honored.
//!
//! ## Example
//!
//! ```yaml
//! installationPath: /usr/share/code/resources/app/out
//! folderMap:
//!   my-tweaks: ~/tweaks
//! mainProcessModules:
//!   - my-tweaks/main
//! browserModules:
//!   - my-tweaks/window
//! ```

use crate::defaults::DEFAULT_NOTIFICATION_WINDOW;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parsed contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Root of the host application's installation (the directory holding
    /// its entry script).
    #[serde(default)]
    pub installation_path: Option<PathBuf>,

    /// Root for generated shims, bundled data and persisted state.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Directory used to decide whether a contribution's source is still
    /// installed.
    #[serde(default)]
    pub extensions_path: Option<PathBuf>,

    /// Debounce window for remediation notifications, in seconds.
    #[serde(default)]
    pub notification_window_secs: Option<u64>,

    /// Folder name to path table (untyped, validated later).
    #[serde(default)]
    pub folder_map: serde_yaml::Value,

    /// Extra main-process module identifiers (untyped, validated later).
    #[serde(default)]
    pub main_process_modules: serde_yaml::Value,

    /// Extra UI-process module identifiers (untyped, validated later).
    #[serde(default)]
    pub browser_modules: serde_yaml::Value,
}

impl Settings {
    /// The configured notification window, or the default.
    pub fn notification_window(&self) -> Duration {
        self.notification_window_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_NOTIFICATION_WINDOW)
    }
}

/// Parse settings from YAML text.
///
/// Empty input (or input holding only comments) yields default settings.
///
/// # Examples
///
/// ```
/// use monkey_patch::config::parse;
///
/// let settings = parse("installationPath: /opt/app").unwrap();
/// assert_eq!(
///     settings.installation_path.as_deref(),
///     Some(std::path::Path::new("/opt/app"))
/// );
/// ```
pub fn parse(text: &str) -> Result<Settings> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some("settings must be a YAML mapping, check indentation and quoting".to_string()),
    })?;

    match value {
        serde_yaml::Value::Null => Ok(Settings::default()),
        serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(value).map_err(|e| Error::ConfigParse {
                message: e.to_string(),
                hint: Some(
                    "installationPath, storagePath and extensionsPath must be strings; \
                     notificationWindowSecs must be a number"
                        .to_string(),
                ),
            })
        }
        _ => Err(Error::ConfigParse {
            message: "top level of the settings file is not a mapping".to_string(),
            hint: Some("start the file with `key: value` pairs".to_string()),
        }),
    }
}

/// Load settings from a file. A missing file yields default settings.
pub fn from_file(path: &Path) -> Result<Settings> {
    if !path.exists() {
        log::debug!("Settings file {} not found, using defaults", path.display());
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}
