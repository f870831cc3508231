//! # Monkey Patch CLI
//!
//! Binary entry point for the `monkey-patch` command-line tool.
//!
//! It parses arguments with `clap`, sets up logging and dispatches to the
//! subcommands in [`commands`]. All patching logic lives in the library
//! crate; the binary only loads settings and reports outcomes.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
