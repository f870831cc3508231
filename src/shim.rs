//! # Shim Generation
//!
//! The host's loader executes two generated source files early in its
//! startup:
//!
//! - the **main-process shim** (`main.js`), a loader-configuration fragment:
//!   a `paths` table followed by a `define` of the main-process modules;
//! - the **UI-process shim** (`browser-entrypoint.js`), which decorates the
//!   host's window bootstrap so every window gets the same `paths` table and
//!   loads the UI modules.
//!
//! Both are pure functions of the current [`Manifest`] (plus which module
//! files exist on disk): the folder table is emitted in ascending key order
//! and every interpolated value goes through [`js_string`], so the same
//! manifest always renders byte-identical text. [`write_if_changed`] compares
//! content rather than timestamps, which lets the reconciler tell a real
//! change from a no-op regeneration.
//!
//! ## Host contract
//!
//! The UI shim wraps `bootstrap-window`'s `load(modulePaths, resultCallback,
//! options)` and chains `options.beforeLoaderConfig`, the hook the host
//! offers for adjusting its loader configuration. The wrapped `load` and the
//! module-resolution callback are not a published API; the shim states the
//! contract version it was written against in its header so a host upgrade
//! that breaks it is easy to spot.

use crate::error::Result;
use crate::manifest::Manifest;
use crate::remediation::Regeneration;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Extension the host loader appends to module identifiers.
pub const SOURCE_EXTENSION: &str = "js";

/// Version of the host interception contract the UI shim relies on.
pub const HOST_CONTRACT: &str = "bootstrap-window.load(modulePaths, resultCallback, options) v1";

const GENERATED_HEADER: &str = "// Generated by monkey-patch. Do not edit.";

/// Renders the two shim artifacts from a manifest.
#[derive(Debug, Clone)]
pub struct ShimGenerator {
    manifest: Manifest,
    installation_root: PathBuf,
    home: Option<PathBuf>,
}

impl ShimGenerator {
    /// Create a generator for a host installed at `installation_root`, using
    /// the current user's home directory for `~/` expansion.
    pub fn new(installation_root: impl Into<PathBuf>) -> Self {
        Self {
            manifest: Manifest::default(),
            installation_root: installation_root.into(),
            home: dirs::home_dir(),
        }
    }

    /// Override the directory `~/` expands to.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Replace the working manifest.
    pub fn set_manifest(&mut self, manifest: Manifest) {
        self.manifest = manifest;
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Render the main-process loader configuration.
    pub fn render_main_process_shim(&self) -> String {
        let modules = self.filter_existing(&self.manifest.main_process_modules);

        let mut out = String::new();
        out.push_str(GENERATED_HEADER);
        out.push('\n');
        out.push_str("require.config({\n");
        out.push_str("    paths: {\n");
        out.push_str(&self.paths_table("        ", " : "));
        out.push_str("    }\n");
        out.push_str("});\n\n");
        out.push_str(&format!("define({}, function () {{}});\n", js_array(&modules)));
        out
    }

    /// Render the UI-process window bootstrap decorator.
    ///
    /// The shim is loaded as a classic script right before the host's own
    /// `workbench.js`, and classic scripts share one global lexical scope.
    /// Everything therefore lives inside a function expression; the shim
    /// must not declare any top-level `const`, `let` or `class`.
    pub fn render_ui_process_shim(&self) -> String {
        let modules = self.filter_existing(&self.manifest.browser_modules);
        let bootstrap_window = self.format_path_for_embedding(
            &self.installation_root.join("bootstrap-window"),
            false,
        );

        let mut out = String::new();
        out.push_str(GENERATED_HEADER);
        out.push('\n');
        out.push_str(&format!("// host-contract: {}\n", HOST_CONTRACT));
        out.push_str("(function () {\n");
        out.push_str("\t'use strict';\n\n");
        out.push_str(&format!(
            "\tconst bootstrapWindow = require({});\n",
            js_string(&bootstrap_window)
        ));
        out.push_str("\tconst hostLoad = bootstrapWindow.load;\n\n");
        out.push_str("\tconst monkeyPatchPaths = {\n");
        out.push_str(&self.paths_table("\t\t", ": "));
        out.push_str("\t};\n\n");
        out.push_str(&format!(
            "\tconst monkeyPatchModules = {};\n\n",
            js_array(&modules)
        ));
        out.push_str(UI_DECORATOR);
        out.push_str("})();\n");
        out
    }

    /// Keep only the module identifiers whose source file exists.
    ///
    /// The leading segment of each identifier is looked up in the folder
    /// table (case-sensitive). Unmapped identifiers are resolved as paths,
    /// relative ones against the installation root.
    pub fn filter_existing(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter(|id| {
                let file = self.module_file(id);
                let exists = file.is_file();
                if !exists {
                    log::debug!("Skipping module {}: {} does not exist", id, file.display());
                }
                exists
            })
            .cloned()
            .collect()
    }

    /// Expand a leading `~/` to the home directory.
    pub fn expand_home(&self, path: &Path) -> PathBuf {
        let text = path.to_string_lossy();
        match (&self.home, text.strip_prefix("~/")) {
            (Some(home), Some(rest)) => home.join(rest),
            _ => path.to_path_buf(),
        }
    }

    /// Normalize a path for embedding in loader path syntax.
    ///
    /// Separators become `/`. With `relative` set, the path is expressed
    /// relative to the installation root when both share a root; otherwise
    /// the absolute form is kept. The result is raw text; quoting is the
    /// renderer's job (see [`js_string`]).
    pub fn format_path_for_embedding(&self, path: &Path, relative: bool) -> String {
        let path = self.expand_home(path);
        let chosen = if relative {
            relative_path(&path, &self.installation_root).unwrap_or(path)
        } else {
            path
        };
        chosen.to_string_lossy().replace('\\', "/")
    }

    /// Render both shims and write the ones whose content changed.
    pub fn generate(&self, main_path: &Path, ui_path: &Path) -> Result<Regeneration> {
        let main_changed = write_if_changed(main_path, &self.render_main_process_shim())?;
        let ui_changed = write_if_changed(ui_path, &self.render_ui_process_shim())?;
        Ok(Regeneration {
            main_changed,
            ui_changed,
        })
    }

    fn module_file(&self, id: &str) -> PathBuf {
        let (head, rest) = match id.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (id, None),
        };

        let path = match self.manifest.folder_map.get(head) {
            Some(folder) => {
                let folder = self.expand_home(folder);
                match rest {
                    Some(rest) => folder.join(rest),
                    None => folder,
                }
            }
            None => {
                let path = self.expand_home(Path::new(id));
                if path.is_absolute() {
                    path
                } else {
                    self.installation_root.join(path)
                }
            }
        };

        let mut file = OsString::from(path);
        file.push(".");
        file.push(SOURCE_EXTENSION);
        PathBuf::from(file)
    }

    fn paths_table(&self, indent: &str, separator: &str) -> String {
        let entries: Vec<String> = self
            .manifest
            .folder_map
            .iter()
            .map(|(name, path)| {
                format!(
                    "{}{}{}{}",
                    indent,
                    js_string(name),
                    separator,
                    js_string(&self.format_path_for_embedding(path, false))
                )
            })
            .collect();

        if entries.is_empty() {
            String::new()
        } else {
            format!("{}\n", entries.join(",\n"))
        }
    }
}

const UI_DECORATOR: &str = "\
\tbootstrapWindow.load = function (modulePaths, resultCallback, options) {
\t\toptions = options || {};
\t\tconst hostBeforeLoaderConfig = options.beforeLoaderConfig;
\t\toptions.beforeLoaderConfig = function (configuration, loaderConfig) {
\t\t\tif (typeof hostBeforeLoaderConfig === 'function') {
\t\t\t\thostBeforeLoaderConfig(configuration, loaderConfig);
\t\t\t}
\t\t\tloaderConfig.paths = Object.assign({}, loaderConfig.paths, monkeyPatchPaths);
\t\t};

\t\tconst patchedResultCallback = function (firstModule, configuration) {
\t\t\trequire(monkeyPatchModules, function () { });
\t\t\treturn resultCallback(firstModule, configuration);
\t\t};

\t\treturn hostLoad.call(this, modulePaths, patchedResultCallback, options);
\t};
";

/// Quote and escape a value as a JavaScript string literal.
///
/// Quotes, backslashes and control characters are escaped; the line and
/// paragraph separators are escaped too since older engines reject them
/// inside literals.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Escape a value for use inside an existing double-quoted literal.
pub fn js_string_content(value: &str) -> String {
    let quoted = js_string(value);
    quoted[1..quoted.len() - 1].to_string()
}

fn js_array(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| js_string(v)).collect();
    format!("[{}]", items.join(", "))
}

/// Express `path` relative to `base`, when both are absolute and share a
/// root.
pub fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    if !path.is_absolute() || !base.is_absolute() {
        return None;
    }

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    if path_parts.first() != base_parts.first() {
        return None;
    }

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}

/// Write `text` to `path` unless the file already holds exactly that text.
///
/// Parent directories are created as needed. Returns whether a write
/// happened.
pub fn write_if_changed(path: &Path, text: &str) -> Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == text.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    log::debug!("Wrote {}", path.display());
    Ok(true)
}
