//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, GlobalOptions};

/// Monkey Patch - Inject custom loader modules into an installed editor
#[derive(Parser, Debug)]
#[command(name = "monkey-patch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the settings file
    #[arg(long, global = true, value_name = "PATH", env = "MONKEY_PATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Host installation root (overrides installationPath in settings)
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "MONKEY_PATCH_INSTALLATION"
    )]
    installation: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Patch the host installation
    #[command(alias = "enable")]
    Install(commands::install::InstallArgs),

    /// Restore the host's original startup files
    #[command(alias = "disable")]
    Uninstall(commands::uninstall::UninstallArgs),

    /// Show whether the installation is patched
    Status(commands::status::StatusArgs),

    /// Rebuild the generated shims from settings and contributions
    Regenerate(commands::regenerate::RegenerateArgs),

    /// Register modules on behalf of another tool
    Contribute(commands::contribute::ContributeArgs),

    /// Remove a registered contribution
    Withdraw(commands::contribute::WithdrawArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .format_timestamp(None)
        .try_init();

        let global = GlobalOptions {
            config: self.config,
            installation: self.installation,
            color: self.color,
        };

        match self.command {
            Commands::Install(args) => commands::install::execute(args, &global),
            Commands::Uninstall(args) => commands::uninstall::execute(args, &global),
            Commands::Status(args) => commands::status::execute(args, &global),
            Commands::Regenerate(args) => commands::regenerate::execute(args, &global),
            Commands::Contribute(args) => commands::contribute::execute(args, &global),
            Commands::Withdraw(args) => commands::contribute::withdraw(args, &global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
