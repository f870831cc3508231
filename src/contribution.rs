//! Resolution of contribution sources.
//!
//! Other tools register contributions under a source identity (for example
//! an editor extension id such as `acme.theme`). A contribution is only
//! honored while its source is still installed, so an uninstalled extension
//! stops injecting modules without having to withdraw explicitly.

use std::fs;
use std::path::PathBuf;

/// Decides whether a contribution's declared source is currently present.
pub trait SourceRegistry {
    fn is_resolvable(&self, source_id: &str) -> bool;
}

/// Resolves sources against an editor-style extensions directory.
///
/// A source `publisher.name` is resolvable when the directory contains an
/// entry named exactly `publisher.name` or `publisher.name-<version>`. With no
/// directory configured every source is considered resolvable.
#[derive(Debug, Clone, Default)]
pub struct ExtensionsDirRegistry {
    dir: Option<PathBuf>,
}

impl ExtensionsDirRegistry {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl SourceRegistry for ExtensionsDirRegistry {
    fn is_resolvable(&self, source_id: &str) -> bool {
        let Some(dir) = &self.dir else {
            return true;
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Cannot read extensions directory {}: {}", dir.display(), e);
                return false;
            }
        };

        let versioned_prefix = format!("{}-", source_id);
        entries.filter_map(|entry| entry.ok()).any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name == source_id || name.starts_with(&versioned_prefix)
        })
    }
}
