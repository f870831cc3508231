//! # Contribute and Withdraw Command Implementations
//!
//! Other tools register modules under their own source identity with
//! `contribute`, passing a JSON or YAML file with optional `folderMap`,
//! `mainProcessModules` and `browserModules` keys. The payload is stored as
//! given and validated each time the manifest is rebuilt. `withdraw` removes
//! it again.
//!
//! ## Example
//!
//! ```bash
//! monkey-patch contribute acme.theme ./acme-modules.json
//! monkey-patch withdraw acme.theme
//! ```

use anyhow::{Context, Result};
use clap::Args;
use monkey_patch::output::emoji;
use std::fs;
use std::path::PathBuf;

use super::{report_diagnostics, report_remediation, GlobalOptions};

/// Arguments for the contribute command
#[derive(Args, Debug)]
pub struct ContributeArgs {
    /// Source identity, e.g. an extension id such as `publisher.name`
    pub source_id: String,

    /// JSON or YAML file holding the contribution
    pub file: PathBuf,
}

/// Arguments for the withdraw command
#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Source identity the contribution was registered under
    pub source_id: String,
}

/// Execute the `contribute` command.
pub fn execute(args: ContributeArgs, global: &GlobalOptions) -> Result<()> {
    let out = global.output();
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    // YAML is a superset of JSON, so one parser covers both formats.
    let payload: serde_json::Value = serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;
    if !payload.is_object() {
        anyhow::bail!(
            "Contribution in {} must be an object with folderMap, mainProcessModules or browserModules",
            args.file.display()
        );
    }

    let mut reconciler = global.reconciler()?;
    let outcome = reconciler.contribute(&args.source_id, payload)?;
    report_diagnostics(&out, &outcome.diagnostics);
    println!(
        "{} Registered contribution from {}",
        emoji(&out, "✅", "[OK]"),
        args.source_id
    );

    report_remediation(&out, &mut reconciler, outcome.regeneration)
}

/// Execute the `withdraw` command.
pub fn withdraw(args: WithdrawArgs, global: &GlobalOptions) -> Result<()> {
    let out = global.output();
    let mut reconciler = global.reconciler()?;

    let Some(outcome) = reconciler.withdraw(&args.source_id)? else {
        println!(
            "{} No contribution registered for {}",
            emoji(&out, "ℹ️ ", "[INFO]"),
            args.source_id
        );
        return Ok(());
    };

    report_diagnostics(&out, &outcome.diagnostics);
    println!(
        "{} Withdrew contribution from {}",
        emoji(&out, "✅", "[OK]"),
        args.source_id
    );
    report_remediation(&out, &mut reconciler, outcome.regeneration)
}
