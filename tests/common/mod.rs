//! Shared test utilities for the CLI end-to-end tests.
//!
//! [`TestFixture`] builds a fake host installation (entry script and
//! workbench HTML) plus a settings file pointing at it, all inside one
//! temporary directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new();
//!     fixture.command().arg("status").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::host;
    pub use super::TestFixture;
}

/// Contents of the fake host installation.
#[allow(dead_code)]
pub mod host {
    /// The host's original entry script.
    pub const ENTRY_SCRIPT: &str = "// host bootstrap\nexports.load = function () {};\n";

    /// The host's original workbench document.
    pub const WORKBENCH_HTML: &str = "<!DOCTYPE html>\n<html>\n<body>\n\t<script src=\"workbench.js\"></script>\n</body>\n</html>\n";

    /// Entry script location relative to the installation root.
    pub const ENTRY_SCRIPT_PATH: &str = "bootstrap-amd.js";

    /// Backup location relative to the installation root.
    pub const BACKUP_PATH: &str = "bootstrap-amd.js.monkey-patch.backup";

    /// Workbench document location relative to the installation root.
    pub const WORKBENCH_PATH: &str = "vs/code/electron-browser/workbench/workbench.html";

    /// Patched workbench document location relative to the installation root.
    pub const PATCHED_WORKBENCH_PATH: &str =
        "vs/code/electron-browser/workbench/workbench-monkey-patch.html";
}

/// A temporary host installation, storage root and settings file.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a fixture with a fake host and settings pointing at it.
    pub fn new() -> Self {
        let fixture = Self::bare();
        fixture
            .temp_dir
            .child("app")
            .child(host::ENTRY_SCRIPT_PATH)
            .write_str(host::ENTRY_SCRIPT)
            .expect("Failed to write entry script");
        fixture
            .temp_dir
            .child("app")
            .child(host::WORKBENCH_PATH)
            .write_str(host::WORKBENCH_HTML)
            .expect("Failed to write workbench html");
        fixture.with_settings("")
    }

    /// Create a fixture with an empty temporary directory.
    pub fn bare() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the settings file: the installation and storage keys followed by
    /// `extra` YAML.
    pub fn with_settings(self, extra: &str) -> Self {
        let content = format!(
            "installationPath: '{}'\nstoragePath: '{}'\n{}",
            self.installation().display(),
            self.storage().display(),
            extra
        );
        self.with_raw_settings(&content)
    }

    /// Write the settings file verbatim.
    pub fn with_raw_settings(self, content: &str) -> Self {
        self.temp_dir
            .child("settings.yaml")
            .write_str(content)
            .expect("Failed to write settings file");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root of the fake host installation.
    pub fn installation(&self) -> PathBuf {
        self.path().join("app")
    }

    /// Storage root for generated shims and state.
    pub fn storage(&self) -> PathBuf {
        self.path().join("store")
    }

    /// Path of the settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.path().join("settings.yaml")
    }

    /// A file inside the installation.
    #[allow(dead_code)]
    pub fn host_file(&self, relative: &str) -> PathBuf {
        self.installation().join(relative)
    }

    /// Read a file inside the installation.
    #[allow(dead_code)]
    pub fn read_host_file(&self, relative: &str) -> String {
        std::fs::read_to_string(self.host_file(relative)).expect("Failed to read host file")
    }

    /// A command for the binary using this fixture's settings, with colors
    /// off and the environment overrides cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("monkey-patch");
        cmd.current_dir(self.path())
            .env_remove("MONKEY_PATCH_INSTALLATION")
            .env_remove("MONKEY_PATCH_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.settings_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_builds_host() {
        let fixture = TestFixture::new();
        assert!(fixture.host_file(host::ENTRY_SCRIPT_PATH).is_file());
        assert!(fixture.host_file(host::WORKBENCH_PATH).is_file());
        assert!(fixture.settings_path().is_file());
    }

    #[test]
    fn test_settings_are_valid_yaml() {
        let fixture = TestFixture::new().with_settings("mainProcessModules: [a/b]\n");
        let text = std::fs::read_to_string(fixture.settings_path()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        assert!(value.get("installationPath").is_some());
        assert!(value.get("mainProcessModules").is_some());
    }
}
