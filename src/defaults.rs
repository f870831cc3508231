//! Default values for monkey-patch configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;
use std::time::Duration;

/// Name of the settings file inside the configuration directory.
pub const DEFAULT_SETTINGS_FILENAME: &str = "settings.yaml";

/// Window within which repeated notifications of one remediation are suppressed.
pub const DEFAULT_NOTIFICATION_WINDOW: Duration = Duration::from_secs(3);

/// Returns the default settings file location.
///
/// Uses the platform-appropriate configuration directory:
/// - Linux: `~/.config/monkey-patch/settings.yaml`
/// - macOS: `~/Library/Application Support/monkey-patch/settings.yaml`
/// - Windows: `{FOLDERID_RoamingAppData}\monkey-patch\settings.yaml`
///
/// This can be overridden by the `--config` CLI flag or the
/// `MONKEY_PATCH_CONFIG` environment variable.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".monkey-patch"))
        .join("monkey-patch")
        .join(DEFAULT_SETTINGS_FILENAME)
}

/// Returns the default storage root for generated shims, bundled data and
/// persisted state.
///
/// Falls back to `.monkey-patch-data` in the current directory if the
/// platform data directory cannot be determined.
pub fn default_storage_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".monkey-patch-data"))
        .join("monkey-patch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_path_ends_with_filename() {
        let path = default_settings_path();
        assert!(path.ends_with("monkey-patch/settings.yaml"));
    }

    #[test]
    fn test_default_storage_root_is_absolute_or_fallback() {
        let root = default_storage_root();
        assert!(
            root.is_absolute() || root.starts_with(".monkey-patch-data"),
            "Expected absolute path or fallback, got: {:?}",
            root
        );
    }
}
