//! # CLI Command Implementations
//!
//! Each subcommand of `monkey-patch` lives in its own file with an `Args`
//! struct (derived with `clap`) and an `execute` function. The helpers here
//! turn the global flags into settings and a [`Reconciler`], and print the
//! outcomes that several commands share.

pub mod completions;
pub mod contribute;
pub mod install;
pub mod regenerate;
pub mod status;
pub mod uninstall;

use anyhow::{Context, Result};
use monkey_patch::config::{self, Settings};
use monkey_patch::defaults::{default_settings_path, default_storage_root};
use monkey_patch::error::Error;
use monkey_patch::output::{emoji, OutputConfig};
use monkey_patch::paths::InstallationPaths;
use monkey_patch::reconcile::Reconciler;
use monkey_patch::remediation::{Regeneration, Remediation};
use monkey_patch::state::StateStore;
use std::path::PathBuf;
use std::time::SystemTime;

/// Flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub installation: Option<PathBuf>,
    pub color: String,
}

impl GlobalOptions {
    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    /// Load the settings file, applying the `--installation` override.
    pub fn settings(&self) -> Result<Settings> {
        let path = self.config.clone().unwrap_or_else(default_settings_path);
        let mut settings = config::from_file(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        if let Some(installation) = &self.installation {
            settings.installation_path = Some(installation.clone());
        }
        Ok(settings)
    }

    /// Build a reconciler for the configured installation.
    pub fn reconciler(&self) -> Result<Reconciler> {
        let settings = self.settings()?;
        let Some(installation) = settings.installation_path.clone() else {
            anyhow::bail!(
                "No host installation configured. Pass --installation, set \
                 MONKEY_PATCH_INSTALLATION, or add installationPath to the settings file."
            );
        };
        if !installation.is_dir() {
            anyhow::bail!(
                "Host installation not found: {}",
                installation.display()
            );
        }

        let storage = settings
            .storage_path
            .clone()
            .unwrap_or_else(default_storage_root);
        let paths = InstallationPaths::new(installation, &storage);
        let store = StateStore::new(paths.state_file());

        Ok(Reconciler::new(Box::new(paths), store, settings)?)
    }
}

/// Print dropped manifest entries.
pub fn report_diagnostics(out: &OutputConfig, diagnostics: &[Error]) {
    for diagnostic in diagnostics {
        eprintln!("{} {}", emoji(out, "⚠️ ", "[WARN]"), diagnostic);
    }
}

/// Tell the user what to do after `regeneration`, unless a notification of
/// the same kind was just shown.
pub fn report_remediation(
    out: &OutputConfig,
    reconciler: &mut Reconciler,
    regeneration: Regeneration,
) -> Result<()> {
    match reconciler.notify(regeneration, SystemTime::now())? {
        Some(Remediation::Restart) => println!(
            "{} Restart the host application for the change to take effect (a window reload is not enough).",
            emoji(out, "🔄", "[RESTART]")
        ),
        Some(Remediation::Reload) => println!(
            "{} Reload the host's windows for the change to take effect.",
            emoji(out, "🔃", "[RELOAD]")
        ),
        None => {}
    }
    Ok(())
}
