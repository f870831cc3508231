//! # Uninstall Command Implementation
//!
//! Restores the host's original entry script from the backup and removes the
//! patched HTML. Safe to run at any time: on an unpatched installation it
//! does nothing, and after a half-applied install it cleans up whatever was
//! written.

use anyhow::Result;
use clap::Args;
use monkey_patch::output::emoji;
use monkey_patch::paths::PathResolver;
use monkey_patch::remediation::Regeneration;

use super::{report_remediation, GlobalOptions};

/// Arguments for the uninstall command
#[derive(Args, Debug)]
pub struct UninstallArgs {}

/// Execute the `uninstall` command.
pub fn execute(_args: UninstallArgs, global: &GlobalOptions) -> Result<()> {
    let out = global.output();
    let mut reconciler = global.reconciler()?;
    let root = reconciler.paths().installation_root().to_path_buf();

    if !reconciler.uninstall()? {
        println!(
            "{} {} is not patched; nothing to do",
            emoji(&out, "ℹ️ ", "[INFO]"),
            root.display()
        );
        return Ok(());
    }

    println!(
        "{} Restored the original startup files of {}",
        emoji(&out, "✅", "[OK]"),
        root.display()
    );
    report_remediation(
        &out,
        &mut reconciler,
        Regeneration {
            main_changed: true,
            ui_changed: true,
        },
    )
}
