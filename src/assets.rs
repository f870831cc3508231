//! Bundled data written next to the generated shims.
//!
//! The patched entry-script template and the static `monkey-static` modules
//! ship inside the binary. They are written to the data directory on every
//! regeneration, so install and drift detection always render from the same
//! on-disk template.

use crate::error::Result;
use crate::paths::PathResolver;
use crate::shim::write_if_changed;

/// Placeholder in the entry-script template replaced by the generated
/// artifacts root.
pub const ROOT_PLACEHOLDER: &str = "[[MONKEY_PATCH_ROOT]]";

/// Token identifying a patched entry script.
pub const BOOTSTRAP_MARKER: &str = "// [MonkeyPatchBootstrapToken2]";

/// The patched entry-script template.
pub const ENTRY_TEMPLATE: &str = include_str!("../data/bootstrap-amd.js");

/// Static modules served under the reserved folder, as (file name, source).
pub const STATIC_MODULES: &[(&str, &str)] = &[
    (
        "entrypoint-main.js",
        include_str!("../data/modules/entrypoint-main.js"),
    ),
    (
        "entrypoint-browser.js",
        include_str!("../data/modules/entrypoint-browser.js"),
    ),
];

/// Write the bundled data under the resolver's data directory.
///
/// Returns whether any file was (re)written.
pub fn materialize(paths: &dyn PathResolver) -> Result<bool> {
    let mut changed = write_if_changed(&paths.entry_template(), ENTRY_TEMPLATE)?;

    let modules_dir = paths.static_modules_dir();
    for (name, source) in STATIC_MODULES {
        changed |= write_if_changed(&modules_dir.join(name), source)?;
    }

    if changed {
        log::debug!("Refreshed bundled data in {}", paths.data_dir().display());
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{BROWSER_ENTRYPOINT, MAIN_ENTRYPOINT, STATIC_FOLDER};
    use crate::paths::InstallationPaths;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_template_has_one_placeholder_and_marker() {
        assert_eq!(ENTRY_TEMPLATE.matches(ROOT_PLACEHOLDER).count(), 1);
        assert_eq!(ENTRY_TEMPLATE.matches(BOOTSTRAP_MARKER).count(), 1);
    }

    #[test]
    fn test_static_modules_match_builtin_ids() {
        for id in [MAIN_ENTRYPOINT, BROWSER_ENTRYPOINT] {
            let file = format!("{}.js", id.trim_start_matches(&format!("{}/", STATIC_FOLDER)));
            assert!(
                STATIC_MODULES.iter().any(|(name, _)| *name == file),
                "no bundled file for {}",
                id
            );
        }
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let paths = InstallationPaths::new(temp.path().join("app"), temp.path().join("store"));

        assert!(materialize(&paths).unwrap());
        assert!(!materialize(&paths).unwrap());

        assert_eq!(fs::read_to_string(paths.entry_template()).unwrap(), ENTRY_TEMPLATE);
        assert!(paths.static_modules_dir().join("entrypoint-main.js").is_file());
    }

    #[test]
    fn test_materialize_repairs_edited_template() {
        let temp = TempDir::new().unwrap();
        let paths = InstallationPaths::new(temp.path().join("app"), temp.path().join("store"));
        materialize(&paths).unwrap();

        fs::write(paths.entry_template(), "edited").unwrap();
        assert!(materialize(&paths).unwrap());
        assert_eq!(fs::read_to_string(paths.entry_template()).unwrap(), ENTRY_TEMPLATE);
    }
}
