//! Locations of the files the patch engine reads and writes.
//!
//! The [`PathResolver`] trait is the boundary to whatever knows the host
//! application's layout. [`InstallationPaths`] is the default resolver for an
//! Electron host using an AMD loader: an entry script next to an `out/`-style
//! tree with the workbench HTML under `vs/code/electron-browser/workbench`.

use std::path::{Path, PathBuf};

/// Supplies absolute paths for everything the reconciler touches.
pub trait PathResolver {
    /// Root of the host installation; also the directory probed for
    /// writability.
    fn installation_root(&self) -> &Path;

    /// The host's live entry script.
    fn entry_script(&self) -> PathBuf;

    /// Backup slot holding the pre-patch entry script.
    fn entry_backup(&self) -> PathBuf;

    /// The host's original HTML entry document.
    fn entry_html(&self) -> PathBuf;

    /// Patched sibling of the HTML entry document.
    fn patched_html(&self) -> PathBuf;

    /// Output directory for generated shims.
    fn generated_dir(&self) -> PathBuf;

    /// Directory holding the bundled templates and static modules.
    fn data_dir(&self) -> PathBuf;

    /// Generated main-process shim.
    fn main_shim(&self) -> PathBuf {
        self.generated_dir().join("main.js")
    }

    /// Generated UI-process shim.
    fn ui_shim(&self) -> PathBuf {
        self.generated_dir().join("browser-entrypoint.js")
    }

    /// Template for the patched entry script.
    fn entry_template(&self) -> PathBuf {
        self.data_dir().join("bootstrap-amd.js")
    }

    /// Folder the reserved `monkey-static` name maps to.
    fn static_modules_dir(&self) -> PathBuf {
        self.data_dir().join("modules")
    }
}

/// Default resolver built from the host installation root and a storage root.
#[derive(Debug, Clone)]
pub struct InstallationPaths {
    installation: PathBuf,
    storage: PathBuf,
}

impl InstallationPaths {
    pub fn new(installation: impl Into<PathBuf>, storage: impl Into<PathBuf>) -> Self {
        Self {
            installation: installation.into(),
            storage: storage.into(),
        }
    }

    /// Root directory for generated artifacts, data and state.
    pub fn storage_root(&self) -> &Path {
        &self.storage
    }

    /// Location of the persisted state record.
    pub fn state_file(&self) -> PathBuf {
        self.storage.join("state.json")
    }

    fn workbench_dir(&self) -> PathBuf {
        self.installation
            .join("vs")
            .join("code")
            .join("electron-browser")
            .join("workbench")
    }
}

impl PathResolver for InstallationPaths {
    fn installation_root(&self) -> &Path {
        &self.installation
    }

    fn entry_script(&self) -> PathBuf {
        self.installation.join("bootstrap-amd.js")
    }

    fn entry_backup(&self) -> PathBuf {
        self.installation
            .join("bootstrap-amd.js.monkey-patch.backup")
    }

    fn entry_html(&self) -> PathBuf {
        self.workbench_dir().join("workbench.html")
    }

    fn patched_html(&self) -> PathBuf {
        self.workbench_dir().join("workbench-monkey-patch.html")
    }

    fn generated_dir(&self) -> PathBuf {
        self.storage.join("modules")
    }

    fn data_dir(&self) -> PathBuf {
        self.storage.join("data")
    }
}
