//! # Module Manifest
//!
//! The [`Manifest`] is the resolved set of module identifiers and folder
//! mappings that the generated shims inject into the host's loader. It is
//! assembled fresh from settings and contributions every time either changes
//! and is never edited in place.
//!
//! Settings and contribution payloads are untyped. [`ManifestBuilder`]
//! validates them entry by entry: every malformed entry becomes an
//! [`Error::ManifestEntryInvalid`] diagnostic and is dropped, while the rest of
//! the input is still honored.
//!
//! ## Assembly order
//!
//! 1. Built-ins: the reserved `monkey-static` folder and the two static
//!    entrypoint modules.
//! 2. User settings.
//! 3. Contributions, in the order the caller adds them.
//!
//! Module lists keep the first occurrence of each identifier. Folder names
//! are unique; the first definition wins and later ones are reported.

use crate::config::Settings;
use crate::error::Error;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Folder name reserved for the bundled static modules.
pub const STATIC_FOLDER: &str = "monkey-static";

/// Static module loaded first in the main process.
pub const MAIN_ENTRYPOINT: &str = "monkey-static/entrypoint-main";

/// Static module loaded first in every UI window.
pub const BROWSER_ENTRYPOINT: &str = "monkey-static/entrypoint-browser";

/// Source name used in diagnostics for entries coming from the settings file.
pub const SETTINGS_SOURCE: &str = "settings";

/// Resolved modules and folder mappings to inject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Main-process module identifiers, in load order.
    pub main_process_modules: Vec<String>,
    /// UI-process module identifiers, in load order.
    pub browser_modules: Vec<String>,
    /// Folder name to filesystem path. Iterates in ascending key order.
    pub folder_map: BTreeMap<String, PathBuf>,
}

/// Builds a [`Manifest`] from untyped sources, collecting diagnostics.
#[derive(Debug)]
pub struct ManifestBuilder {
    manifest: Manifest,
    diagnostics: Vec<Error>,
}

impl ManifestBuilder {
    /// Start a manifest holding only the built-in entries.
    pub fn new(static_modules_dir: &Path) -> Self {
        let mut manifest = Manifest::default();
        manifest
            .folder_map
            .insert(STATIC_FOLDER.to_string(), static_modules_dir.to_path_buf());
        manifest.main_process_modules.push(MAIN_ENTRYPOINT.to_string());
        manifest.browser_modules.push(BROWSER_ENTRYPOINT.to_string());
        Self {
            manifest,
            diagnostics: Vec::new(),
        }
    }

    /// Add the manifest keys of the user settings file.
    pub fn add_settings(&mut self, settings: &Settings) -> &mut Self {
        self.add_fields(
            SETTINGS_SOURCE,
            &settings.folder_map,
            &settings.main_process_modules,
            &settings.browser_modules,
        );
        self
    }

    /// Add a contribution payload registered by `source_id`.
    ///
    /// The payload must be an object with optional `folderMap`,
    /// `mainProcessModules` and `browserModules` keys.
    pub fn add_contribution(&mut self, source_id: &str, payload: &serde_json::Value) -> &mut Self {
        let value = match serde_yaml::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                self.reject(source_id, "<payload>", e.to_string());
                return self;
            }
        };

        let Value::Mapping(map) = value else {
            self.reject(source_id, "<payload>", "contribution must be an object");
            return self;
        };

        let field = |name: &str| map.get(name).cloned().unwrap_or(Value::Null);
        self.add_fields(
            source_id,
            &field("folderMap"),
            &field("mainProcessModules"),
            &field("browserModules"),
        );
        self
    }

    /// Finish assembly.
    pub fn build(self) -> (Manifest, Vec<Error>) {
        (self.manifest, self.diagnostics)
    }

    fn add_fields(&mut self, source: &str, folder_map: &Value, main: &Value, browser: &Value) {
        self.add_folder_map(source, folder_map);
        for module in self.module_list(source, "mainProcessModules", main) {
            push_unique(&mut self.manifest.main_process_modules, module);
        }
        for module in self.module_list(source, "browserModules", browser) {
            push_unique(&mut self.manifest.browser_modules, module);
        }
    }

    fn add_folder_map(&mut self, source: &str, value: &Value) {
        let map = match value {
            Value::Null => return,
            Value::Mapping(map) => map,
            _ => {
                self.reject(source, "folderMap", "expected a mapping of folder names to paths");
                return;
            }
        };

        for (key, path) in map {
            let Some(name) = key.as_str() else {
                self.reject(source, "folderMap", format!("folder name {:?} is not a string", key));
                continue;
            };
            let entry = format!("folderMap.{}", name);

            if name.is_empty() || name.contains('/') || name.contains('\\') {
                self.reject(source, &entry, "folder names must be non-empty and contain no path separators");
                continue;
            }
            if name == STATIC_FOLDER {
                self.reject(source, &entry, "folder name is reserved");
                continue;
            }
            let Some(path) = path.as_str().filter(|p| !p.trim().is_empty()) else {
                self.reject(source, &entry, "expected a non-empty string path");
                continue;
            };
            if self.manifest.folder_map.contains_key(name) {
                self.reject(source, &entry, "folder name already defined");
                continue;
            }

            self.manifest
                .folder_map
                .insert(name.to_string(), PathBuf::from(path));
        }
    }

    fn module_list(&mut self, source: &str, field: &str, value: &Value) -> Vec<String> {
        let items = match value {
            Value::Null => return Vec::new(),
            Value::Sequence(items) => items,
            _ => {
                self.reject(source, field, "expected a list of module identifiers");
                return Vec::new();
            }
        };

        let mut modules = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match item.as_str().map(str::trim) {
                Some(id) if !id.is_empty() => modules.push(id.to_string()),
                _ => self.reject(
                    source,
                    &format!("{}[{}]", field, index),
                    "expected a non-empty string module identifier",
                ),
            }
        }
        modules
    }

    fn reject(&mut self, source: &str, entry: &str, message: impl Into<String>) {
        let error = Error::ManifestEntryInvalid {
            source_name: source.to_string(),
            entry: entry.to_string(),
            message: message.into(),
        };
        log::warn!("Dropping manifest entry: {}", error);
        self.diagnostics.push(error);
    }
}

fn push_unique(list: &mut Vec<String>, module: String) {
    if !list.contains(&module) {
        list.push(module);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(yaml: &str) -> Settings {
        crate::config::parse(yaml).unwrap()
    }

    #[test]
    fn test_builtins_only() {
        let (manifest, diagnostics) = ManifestBuilder::new(Path::new("/data/modules")).build();

        assert!(diagnostics.is_empty());
        assert_eq!(manifest.main_process_modules, vec![MAIN_ENTRYPOINT]);
        assert_eq!(manifest.browser_modules, vec![BROWSER_ENTRYPOINT]);
        assert_eq!(
            manifest.folder_map.get(STATIC_FOLDER),
            Some(&PathBuf::from("/data/modules"))
        );
    }

    #[test]
    fn test_settings_are_appended_after_builtins() {
        let mut builder = ManifestBuilder::new(Path::new("/data/modules"));
        builder.add_settings(&settings(
            r#"
folderMap:
  tools: /opt/tools
mainProcessModules: [tools/main, tools/main, tools/extra]
browserModules: [tools/window]
"#,
        ));
        let (manifest, diagnostics) = builder.build();

        assert!(diagnostics.is_empty());
        assert_eq!(
            manifest.main_process_modules,
            vec![MAIN_ENTRYPOINT, "tools/main", "tools/extra"]
        );
        assert_eq!(manifest.browser_modules, vec![BROWSER_ENTRYPOINT, "tools/window"]);
        assert_eq!(manifest.folder_map.len(), 2);
    }

    #[test]
    fn test_invalid_entries_are_dropped_individually() {
        let mut builder = ManifestBuilder::new(Path::new("/data/modules"));
        builder.add_settings(&settings(
            r#"
folderMap:
  good: /opt/good
  bad: 17
  "a/b": /opt/ab
  monkey-static: /evil
mainProcessModules: [good/main, 3, ""]
browserModules: not-a-list
"#,
        ));
        let (manifest, diagnostics) = builder.build();

        assert_eq!(manifest.folder_map.len(), 2);
        assert!(manifest.folder_map.contains_key("good"));
        assert_eq!(manifest.folder_map.get(STATIC_FOLDER), Some(&PathBuf::from("/data/modules")));
        assert_eq!(manifest.main_process_modules, vec![MAIN_ENTRYPOINT, "good/main"]);
        assert_eq!(manifest.browser_modules, vec![BROWSER_ENTRYPOINT]);

        // bad, a/b, monkey-static, 3, "", browserModules
        assert_eq!(diagnostics.len(), 6);
        assert!(diagnostics
            .iter()
            .all(|d| matches!(d, Error::ManifestEntryInvalid { source_name, .. } if source_name == SETTINGS_SOURCE)));
    }

    #[test]
    fn test_folder_map_wrong_shape() {
        let mut builder = ManifestBuilder::new(Path::new("/data/modules"));
        builder.add_settings(&settings("folderMap: [a, b]\n"));
        let (manifest, diagnostics) = builder.build();

        assert_eq!(manifest.folder_map.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].to_string().contains("folderMap"));
    }

    #[test]
    fn test_contribution_is_merged() {
        let mut builder = ManifestBuilder::new(Path::new("/data/modules"));
        builder.add_contribution(
            "acme.theme",
            &json!({
                "folderMap": { "acme": "/ext/acme" },
                "mainProcessModules": ["acme/main"],
                "browserModules": ["acme/ui"]
            }),
        );
        let (manifest, diagnostics) = builder.build();

        assert!(diagnostics.is_empty());
        assert_eq!(manifest.main_process_modules, vec![MAIN_ENTRYPOINT, "acme/main"]);
        assert_eq!(manifest.browser_modules, vec![BROWSER_ENTRYPOINT, "acme/ui"]);
        assert_eq!(manifest.folder_map.get("acme"), Some(&PathBuf::from("/ext/acme")));
    }

    #[test]
    fn test_contribution_conflicting_folder_keeps_first() {
        let mut builder = ManifestBuilder::new(Path::new("/data/modules"));
        builder.add_settings(&settings("folderMap:\n  shared: /from/settings\n"));
        builder.add_contribution("acme.theme", &json!({ "folderMap": { "shared": "/from/acme" } }));
        let (manifest, diagnostics) = builder.build();

        assert_eq!(manifest.folder_map.get("shared"), Some(&PathBuf::from("/from/settings")));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].to_string().contains("acme.theme"));
    }

    #[test]
    fn test_contribution_must_be_object() {
        let mut builder = ManifestBuilder::new(Path::new("/data/modules"));
        builder.add_contribution("acme.theme", &json!(["acme/main"]));
        let (manifest, diagnostics) = builder.build();

        assert_eq!(manifest.main_process_modules, vec![MAIN_ENTRYPOINT]);
        assert_eq!(diagnostics.len(), 1);
    }
}
