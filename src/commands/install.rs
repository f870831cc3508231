//! # Install Command Implementation
//!
//! Patches the host installation: regenerates the shims, backs up the entry
//! script (once), and writes the patched entry script and HTML in a single
//! transaction. When the installation directory is not writable the
//! operating system's privilege prompt is shown once for the whole
//! transaction.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use monkey_patch::output::emoji;
use monkey_patch::paths::PathResolver;
use monkey_patch::reconcile::InstallationState;
use monkey_patch::remediation::Regeneration;

use super::{report_remediation, GlobalOptions};

/// Arguments for the install command
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `install` command.
pub fn execute(args: InstallArgs, global: &GlobalOptions) -> Result<()> {
    let out = global.output();
    let mut reconciler = global.reconciler()?;
    let root = reconciler.paths().installation_root().to_path_buf();

    if reconciler.detect_drift()? == InstallationState::Patched {
        println!(
            "{} {} is already patched",
            emoji(&out, "✅", "[OK]"),
            root.display()
        );
        return Ok(());
    }

    if !args.yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Modify the startup files of {}? A backup of the original is kept.",
                root.display()
            ))
            .default(true)
            .interact()?;
        if !proceed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if reconciler.needs_elevation() {
        println!(
            "{} {} is not writable; administrator rights will be requested.",
            emoji(&out, "🔐", "[SUDO]"),
            root.display()
        );
    }

    let committed = reconciler.install()?;
    println!(
        "{} Patched {}",
        emoji(&out, "✅", "[OK]"),
        root.display()
    );

    report_remediation(
        &out,
        &mut reconciler,
        Regeneration {
            main_changed: committed,
            ui_changed: committed,
        },
    )
}
