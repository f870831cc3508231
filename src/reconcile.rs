//! # Reconciliation
//!
//! The [`Reconciler`] owns the patch lifecycle of one host installation. It
//! classifies the installation by inspecting files (the classification is
//! never stored), and drives three operations:
//!
//! - **install**: back up the host's entry script once, overwrite it with the
//!   rendered entry template, and write the patched HTML sibling. Valid from
//!   `Unpatched` and `Drifted`; a no-op from `Patched`.
//! - **uninstall**: restore the backup and remove the patched sibling. Valid
//!   from `Patched` and `Drifted`; a no-op from `Unpatched`, which makes it the
//!   recovery path after a half-applied install.
//! - **regenerate**: rebuild the manifest from settings and contributions and
//!   rewrite whichever shims changed. Valid in any state and never touches
//!   the installation itself.
//!
//! ## Drift
//!
//! With a backup present the installation is `Patched` only when the live
//! entry script and the HTML sibling are byte-identical to what install
//! would write now, recomputed from the current templates. A host upgrade
//! that replaces its own HTML or entry script therefore shows up as
//! `Drifted`, and so does a host upgrade that merely changes the original
//! HTML the sibling was rendered from. The latter is a false positive the
//! user resolves by re-running install.

use crate::assets::{self, BOOTSTRAP_MARKER, ROOT_PLACEHOLDER};
use crate::config::Settings;
use crate::contribution::{ExtensionsDirRegistry, SourceRegistry};
use crate::error::{Error, Result};
use crate::manifest::{Manifest, ManifestBuilder};
use crate::paths::PathResolver;
use crate::remediation::{Debouncer, Regeneration, Remediation};
use crate::shim::{js_string_content, relative_path, ShimGenerator};
use crate::state::{ExtensionState, StateStore};
use crate::transaction::{render_text, CommandRunner, PatchTransaction, SystemCommandRunner};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// The host's own script reference in the HTML entry document.
pub const HOST_SCRIPT_TAG: &str = "<script src=\"workbench.js\"></script>";

const PROBE_FILE: &str = ".monkey-patch-probe";

/// Derived classification of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    Unpatched,
    Patched,
    Drifted,
}

impl fmt::Display for InstallationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallationState::Unpatched => write!(f, "unpatched"),
            InstallationState::Patched => write!(f, "patched"),
            InstallationState::Drifted => write!(f, "drifted"),
        }
    }
}

/// How the generated-artifacts root is written into the entry script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStyle {
    /// Absolute path with forward slashes.
    Absolute,
    /// `file:` followed by the path relative to the installation root. For
    /// loaders that mishandle absolute drive-letter literals.
    RelativeUri,
}

impl RootStyle {
    pub fn native() -> Self {
        if cfg!(windows) {
            RootStyle::RelativeUri
        } else {
            RootStyle::Absolute
        }
    }
}

/// Result of a regeneration.
#[derive(Debug)]
pub struct RegenerateOutcome {
    /// Which shims were rewritten.
    pub regeneration: Regeneration,
    /// Manifest entries that were dropped.
    pub diagnostics: Vec<Error>,
}

/// Drives install, uninstall and regenerate for one host installation.
pub struct Reconciler {
    paths: Box<dyn PathResolver>,
    registry: Box<dyn SourceRegistry>,
    runner: Box<dyn CommandRunner>,
    store: StateStore,
    state: ExtensionState,
    settings: Settings,
    generator: ShimGenerator,
    debouncer: Debouncer,
    root_style: RootStyle,
}

impl Reconciler {
    /// Create a reconciler, loading the persisted state from `store`.
    pub fn new(paths: Box<dyn PathResolver>, store: StateStore, settings: Settings) -> Result<Self> {
        let state = store.load()?;
        let generator = ShimGenerator::new(paths.installation_root());
        let registry = ExtensionsDirRegistry::new(settings.extensions_path.clone());
        let debouncer = Debouncer::new(settings.notification_window());

        Ok(Self {
            paths,
            registry: Box::new(registry),
            runner: Box::new(SystemCommandRunner),
            store,
            state,
            settings,
            generator,
            debouncer,
            root_style: RootStyle::native(),
        })
    }

    pub fn with_registry(mut self, registry: Box<dyn SourceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_root_style(mut self, root_style: RootStyle) -> Self {
        self.root_style = root_style;
        self
    }

    pub fn state(&self) -> &ExtensionState {
        &self.state
    }

    pub fn paths(&self) -> &dyn PathResolver {
        self.paths.as_ref()
    }

    /// The manifest the shims were last generated from.
    pub fn manifest(&self) -> &Manifest {
        self.generator.manifest()
    }

    /// Classify the installation by inspecting its files.
    pub fn detect_drift(&self) -> Result<InstallationState> {
        let backup = self.paths.entry_backup();
        let patched_html = self.paths.patched_html();

        if !backup.is_file() {
            if self.state.enabled {
                log::debug!("Enabled but {} is missing", backup.display());
                return Ok(InstallationState::Drifted);
            }
            if patched_html.exists() {
                log::debug!("Stray {} without a backup", patched_html.display());
                return Ok(InstallationState::Drifted);
            }
            return Ok(InstallationState::Unpatched);
        }

        let Some(live) = read_optional(&self.paths.entry_script())? else {
            log::debug!("Live entry script is missing");
            return Ok(InstallationState::Drifted);
        };
        if !live.contains(BOOTSTRAP_MARKER) {
            log::debug!("Live entry script has no patch marker");
            return Ok(InstallationState::Drifted);
        }
        let template = self.entry_template_source()?;
        if live != render_text(&template, &self.entry_substitutions()) {
            log::debug!("Live entry script differs from the rendered template");
            return Ok(InstallationState::Drifted);
        }

        let Some(patched) = read_optional(&patched_html)? else {
            log::debug!("Patched HTML {} is missing", patched_html.display());
            return Ok(InstallationState::Drifted);
        };
        let Some(original) = read_optional(&self.paths.entry_html())? else {
            log::debug!("Original HTML is missing");
            return Ok(InstallationState::Drifted);
        };
        if !original.contains(HOST_SCRIPT_TAG) {
            log::debug!("Original HTML has no {} to patch", HOST_SCRIPT_TAG);
            return Ok(InstallationState::Drifted);
        }
        if patched != render_text(&original, &self.html_substitutions()) {
            log::debug!("Patched HTML differs from the rendered original");
            return Ok(InstallationState::Drifted);
        }

        Ok(InstallationState::Patched)
    }

    /// Apply the patch. Returns whether a transaction was committed.
    pub fn install(&mut self) -> Result<bool> {
        self.regenerate()?;

        let current = self.detect_drift()?;
        if current == InstallationState::Patched {
            log::info!("Installation is already patched");
            self.set_enabled(true)?;
            return Ok(false);
        }

        let entry_script = self.paths.entry_script();
        let entry_html = self.paths.entry_html();
        if let Some(html) = read_optional(&entry_html)? {
            if !html.contains(HOST_SCRIPT_TAG) {
                return Err(Error::InjectionPointMissing {
                    path: entry_html.display().to_string(),
                    tag: HOST_SCRIPT_TAG.to_string(),
                });
            }
        }

        let mut tx = PatchTransaction::new()?;
        let backup = self.paths.entry_backup();
        if !backup.is_file() {
            tx.copy(&entry_script, &backup);
        }
        tx.add_file_from_template(
            &self.paths.entry_template(),
            &entry_script,
            &self.entry_substitutions(),
        )?;
        tx.add_file_from_template(
            &entry_html,
            &self.paths.patched_html(),
            &self.html_substitutions(),
        )?;

        let elevated = self.needs_elevation();
        tx.commit(elevated, self.runner.as_ref())?;
        log::info!("Patched installation from {} state", current);

        self.set_enabled(true)?;
        Ok(true)
    }

    /// Remove the patch. Returns whether anything had to be undone.
    pub fn uninstall(&mut self) -> Result<bool> {
        let current = self.detect_drift()?;
        if current == InstallationState::Unpatched {
            log::info!("Installation is not patched");
            return Ok(false);
        }

        let mut tx = PatchTransaction::new()?;
        let entry_script = self.paths.entry_script();
        let backup = self.paths.entry_backup();
        if backup.is_file() {
            tx.remove(&entry_script);
            tx.move_file(&backup, &entry_script);
        }
        let patched_html = self.paths.patched_html();
        if patched_html.exists() {
            tx.remove(&patched_html);
        }

        let elevated = !tx.is_empty() && self.needs_elevation();
        tx.commit(elevated, self.runner.as_ref())?;
        log::info!("Removed patch from {} installation", current);

        self.set_enabled(false)?;
        Ok(true)
    }

    /// Rebuild the manifest and rewrite the shims whose content changed.
    pub fn regenerate(&mut self) -> Result<RegenerateOutcome> {
        assets::materialize(self.paths.as_ref())?;

        let mut builder = ManifestBuilder::new(&self.paths.static_modules_dir());
        builder.add_settings(&self.settings);
        for (source_id, payload) in &self.state.contributions {
            if self.registry.is_resolvable(source_id) {
                builder.add_contribution(source_id, payload);
            } else {
                log::debug!("Ignoring contribution from unresolvable source {}", source_id);
            }
        }
        let (manifest, diagnostics) = builder.build();

        self.generator.set_manifest(manifest);
        let regeneration = self
            .generator
            .generate(&self.paths.main_shim(), &self.paths.ui_shim())?;

        Ok(RegenerateOutcome {
            regeneration,
            diagnostics,
        })
    }

    /// Register a contribution payload under `source_id` and regenerate.
    pub fn contribute(&mut self, source_id: &str, payload: serde_json::Value) -> Result<RegenerateOutcome> {
        self.state
            .contributions
            .insert(source_id.to_string(), payload);
        self.store.save(&self.state)?;
        self.regenerate()
    }

    /// Drop the contribution of `source_id` and regenerate.
    ///
    /// Returns `None` when no such contribution was registered.
    pub fn withdraw(&mut self, source_id: &str) -> Result<Option<RegenerateOutcome>> {
        if self.state.contributions.remove(source_id).is_none() {
            return Ok(None);
        }
        self.store.save(&self.state)?;
        self.regenerate().map(Some)
    }

    /// The remediation to surface for `regeneration`, unless one of the same
    /// kind was surfaced within the notification window.
    pub fn notify(&mut self, regeneration: Regeneration, now: SystemTime) -> Result<Option<Remediation>> {
        let Some(remediation) = regeneration.remediation() else {
            return Ok(None);
        };
        if !self
            .debouncer
            .admit(&mut self.state.last_notified, remediation, now)
        {
            return Ok(None);
        }
        self.store.save(&self.state)?;
        Ok(Some(remediation))
    }

    /// Whether writing into the installation needs elevated privileges.
    pub fn needs_elevation(&self) -> bool {
        match probe_writable(self.paths.installation_root()) {
            Ok(()) => false,
            Err(e) => {
                log::info!("{}; elevating", e);
                true
            }
        }
    }

    /// Substitutions rendering the entry-script template.
    pub fn entry_substitutions(&self) -> Vec<(String, String)> {
        let generated = self.paths.generated_dir();
        let root = match self.root_style {
            RootStyle::Absolute => self.generator.format_path_for_embedding(&generated, false),
            RootStyle::RelativeUri => {
                match relative_path(&generated, self.paths.installation_root()) {
                    Some(relative) => format!("file:{}", relative.to_string_lossy().replace('\\', "/")),
                    None => to_file_uri(&generated),
                }
            }
        };
        vec![(ROOT_PLACEHOLDER.to_string(), js_string_content(&root))]
    }

    /// Substitutions rendering the patched HTML sibling.
    pub fn html_substitutions(&self) -> Vec<(String, String)> {
        let src = html_attribute(&to_file_uri(&self.paths.ui_shim()));
        vec![(
            HOST_SCRIPT_TAG.to_string(),
            format!("<script src=\"{}\"></script>\n\t{}", src, HOST_SCRIPT_TAG),
        )]
    }

    fn entry_template_source(&self) -> Result<String> {
        Ok(read_optional(&self.paths.entry_template())?
            .unwrap_or_else(|| assets::ENTRY_TEMPLATE.to_string()))
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.state.enabled = enabled;
        self.store.save(&self.state)?;
        Ok(())
    }
}

/// Check that `dir` accepts new files by creating and removing a probe file.
pub fn probe_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(PROBE_FILE);
    let denied = |e: io::Error| Error::PermissionDenied {
        path: dir.display().to_string(),
        reason: e.to_string(),
    };

    fs::write(&probe, b"").map_err(denied)?;
    fs::remove_file(&probe).map_err(denied)
}

/// Format a local path as a `file://` URI.
///
/// A leading drive letter becomes `/C:` and backslashes become slashes.
pub fn to_file_uri(path: &Path) -> String {
    let text = path.to_string_lossy();
    let bytes = text.as_bytes();
    let text = if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        format!("/{}:{}", (bytes[0] as char).to_ascii_uppercase(), &text[2..])
    } else {
        text.to_string()
    };
    format!("file://{}", text.replace('\\', "/"))
}

fn html_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
