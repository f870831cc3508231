//! # Monkey Patch Library
//!
//! This library patches the startup files of an installed desktop application
//! (an Electron host with an AMD module loader) so that its loader picks up
//! externally supplied modules, without touching the application's installer.
//! It backs the `monkey-patch` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use monkey_patch::manifest::ManifestBuilder;
//! use monkey_patch::shim::ShimGenerator;
//! use std::path::Path;
//!
//! let settings = monkey_patch::config::parse(
//!     "folderMap:\n  tweaks: /opt/tweaks\nmainProcessModules: [tweaks/main]\n",
//! ).unwrap();
//!
//! let mut builder = ManifestBuilder::new(Path::new("/data/modules"));
//! builder.add_settings(&settings);
//! let (manifest, diagnostics) = builder.build();
//! assert!(diagnostics.is_empty());
//!
//! let mut generator = ShimGenerator::new("/opt/app/out");
//! generator.set_manifest(manifest);
//! let shim = generator.render_main_process_shim();
//! assert!(shim.contains("\"tweaks\" : \"/opt/tweaks\""));
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`)**: the module identifiers and folder mappings to
//!   inject, assembled from settings (`config`) and contributions
//!   (`contribution`, `state`), validated entry by entry.
//! - **Shims (`shim`)**: two generated loader sources rendered
//!   deterministically from the manifest and written only when they change.
//! - **Transactions (`transaction`)**: queued file operations on the
//!   protected installation, committed as one optionally elevated script.
//! - **Reconciliation (`reconcile`)**: install, uninstall and regenerate, plus
//!   drift detection that recomputes the expected patched files and compares
//!   them byte for byte.
//! - **Remediation (`remediation`)**: whether a change needs a restart or a
//!   reload, with debounced notifications.
//!
//! ## Execution Flow
//!
//! 1. **Regenerate**: materialize bundled data (`assets`), build the
//!    manifest, write the shims, report which changed.
//! 2. **Install**: back up the entry script once, render the entry template
//!    and the patched HTML in a scratch directory, commit them in one script.
//! 3. **Uninstall**: restore the backup and remove the patched HTML.

pub mod assets;
pub mod config;
pub mod contribution;
pub mod defaults;
pub mod error;
pub mod manifest;
pub mod output;
pub mod paths;
pub mod reconcile;
pub mod remediation;
pub mod shim;
pub mod state;
pub mod transaction;

#[cfg(test)]
mod shim_proptest;
