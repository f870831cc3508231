//! # Status Command Implementation
//!
//! Classifies the installation and prints where the patch engine keeps its
//! files. A drifted installation usually means the host was updated and
//! replaced the patched files.

use anyhow::Result;
use clap::Args;
use monkey_patch::output::{emoji, state_label};
use monkey_patch::paths::PathResolver;
use monkey_patch::reconcile::InstallationState;

use super::GlobalOptions;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also list registered contributions
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, global: &GlobalOptions) -> Result<()> {
    let out = global.output();
    let reconciler = global.reconciler()?;
    let state = reconciler.detect_drift()?;
    let paths = reconciler.paths();

    println!(
        "{} Installation: {}",
        emoji(&out, "🐒", "[STATUS]"),
        paths.installation_root().display()
    );
    println!("   State: {}", state_label(&out, state));
    println!("   Enabled: {}", reconciler.state().enabled);
    println!("   Generated shims: {}", paths.generated_dir().display());
    println!(
        "   Contributions: {}",
        reconciler.state().contributions.len()
    );
    if args.verbose {
        for source_id in reconciler.state().contributions.keys() {
            println!("     - {}", source_id);
        }
    }

    if state == InstallationState::Drifted {
        println!();
        println!(
            "{} The patch seems to have been overwritten, usually by a host update.",
            emoji(&out, "⚠️ ", "[WARN]")
        );
        println!("   Run `monkey-patch install` to re-apply it or `monkey-patch uninstall` to disable it.");
    }

    Ok(())
}
