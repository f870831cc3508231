//! # Completions Command Implementation
//!
//! This module implements the `completions` subcommand, which prints a shell
//! completion script for `monkey-patch` to stdout. Scripts are generated
//! from the clap definition in [`crate::cli`] with `clap_complete`, so new
//! subcommands and flags complete without further work.
//!
//! ## Supported Shells
//!
//! - **Bash**: save under `bash-completion/completions/` or source it
//! - **Zsh**: save as `_monkey-patch` somewhere on `fpath`
//! - **Fish**: save under `~/.config/fish/completions/`
//! - **PowerShell**: dot-source from the profile
//! - **Elvish**: `eval` from `rc.elv`
//!
//! ## Example
//!
//! ```bash
//! monkey-patch completions bash > ~/.local/share/bash-completion/completions/monkey-patch
//! monkey-patch completions zsh > ~/.zfunc/_monkey-patch
//! monkey-patch completions fish > ~/.config/fish/completions/monkey-patch.fish
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

use crate::cli::Cli;

const BIN_NAME: &str = "monkey-patch";

/// Shell types for completion generation
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Fish Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish Shell
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Execute the `completions` command.
///
/// Writes the script for the requested shell to stdout; redirect it to the
/// file your shell loads completions from.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell.into(), &mut io::stdout())
}

fn write_completions(shell: Shell, buf: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, buf);
    Ok(())
}
