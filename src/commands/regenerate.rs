//! # Regenerate Command Implementation
//!
//! Rebuilds the manifest from the settings file and the registered
//! contributions and rewrites the shims whose content changed. Meant to be
//! called whenever the settings file is edited; an unchanged manifest
//! rewrites nothing and asks for nothing.

use anyhow::Result;
use clap::Args;
use monkey_patch::output::emoji;

use super::{report_diagnostics, report_remediation, GlobalOptions};

/// Arguments for the regenerate command
#[derive(Args, Debug)]
pub struct RegenerateArgs {
    /// Suppress all output except errors and remediation hints
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `regenerate` command.
pub fn execute(args: RegenerateArgs, global: &GlobalOptions) -> Result<()> {
    let out = global.output();
    let mut reconciler = global.reconciler()?;

    let outcome = reconciler.regenerate()?;
    report_diagnostics(&out, &outcome.diagnostics);

    if !args.quiet {
        let regeneration = outcome.regeneration;
        if regeneration.changed() {
            println!(
                "{} Regenerated shims (main process: {}, windows: {})",
                emoji(&out, "🔧", "[GEN]"),
                if regeneration.main_changed { "changed" } else { "unchanged" },
                if regeneration.ui_changed { "changed" } else { "unchanged" },
            );
        } else {
            println!("{} Shims are up to date", emoji(&out, "✅", "[OK]"));
        }
    }

    report_remediation(&out, &mut reconciler, outcome.regeneration)
}
