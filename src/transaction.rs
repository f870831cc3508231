//! # Patch Transactions
//!
//! Writes into the host's installation directory usually need elevated
//! privileges, and a user should be asked for them at most once per change.
//! A [`PatchTransaction`] therefore never touches the installation directly.
//! It stages rendered files in a private scratch directory, queues the file
//! operations, and on [`commit`](PatchTransaction::commit) emits them as a
//! single shell script that runs in one process, elevated or not.
//!
//! The script stops at the first failing operation. Operations are not rolled
//! back; callers order them so that an aborted run leaves a recoverable state
//! (the backup is always taken before anything is overwritten).
//!
//! ```no_run
//! use monkey_patch::transaction::{PatchTransaction, SystemCommandRunner};
//! use std::path::Path;
//!
//! let mut tx = PatchTransaction::new()?;
//! tx.copy(Path::new("/opt/app/main.js"), Path::new("/opt/app/main.js.bak"));
//! tx.add_file_from_template(
//!     Path::new("/data/main.js.template"),
//!     Path::new("/opt/app/main.js"),
//!     &[("[[ROOT]]".to_string(), "/data".to_string())],
//! )?;
//! tx.commit(false, &SystemCommandRunner)?;
//! # Ok::<(), monkey_patch::error::Error>(())
//! ```

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use uuid::Uuid;

const SCRATCH_PREFIX: &str = "monkey-patch-";

/// One queued filesystem operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    Copy { from: PathBuf, to: PathBuf },
    Move { from: PathBuf, to: PathBuf },
    /// Remove a file. A missing file is not an error.
    Remove { path: PathBuf },
    /// A rendered template. `source` with `substitutions` applied was
    /// written to `staged` when the operation was queued; the script copies
    /// it over `destination`.
    RenderTemplate {
        source: PathBuf,
        destination: PathBuf,
        substitutions: Vec<(String, String)>,
        staged: PathBuf,
    },
}

/// Shell language the commit script is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptDialect {
    /// `/bin/sh`
    Posix,
    /// `cmd.exe` batch file
    Batch,
}

impl ScriptDialect {
    /// The dialect of the current platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            ScriptDialect::Batch
        } else {
            ScriptDialect::Posix
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            ScriptDialect::Posix => "script.sh",
            ScriptDialect::Batch => "script.bat",
        }
    }

    /// Render `operations` as a script that runs inside `scratch`.
    pub fn render(self, scratch: &Path, operations: &[FileOperation]) -> String {
        let mut lines = Vec::with_capacity(operations.len() + 3);
        match self {
            ScriptDialect::Posix => {
                lines.push("#!/bin/sh".to_string());
                lines.push("set -e".to_string());
                lines.push(format!("cd {}", sh_quote(scratch)));
                for op in operations {
                    lines.push(match op {
                        FileOperation::Copy { from, to }
                        | FileOperation::RenderTemplate {
                            staged: from,
                            destination: to,
                            ..
                        } => {
                            format!("cp -f {} {}", sh_quote(from), sh_quote(to))
                        }
                        FileOperation::Move { from, to } => {
                            format!("mv -f {} {}", sh_quote(from), sh_quote(to))
                        }
                        FileOperation::Remove { path } => format!("rm -f {}", sh_quote(path)),
                    });
                }
            }
            ScriptDialect::Batch => {
                lines.push("@echo off".to_string());
                lines.push(format!("cd /d {} || exit /b 1", batch_quote(scratch)));
                for op in operations {
                    lines.push(match op {
                        FileOperation::Copy { from, to }
                        | FileOperation::RenderTemplate {
                            staged: from,
                            destination: to,
                            ..
                        } => format!(
                            "copy /y {} {} >nul || exit /b 1",
                            batch_quote(from),
                            batch_quote(to)
                        ),
                        FileOperation::Move { from, to } => format!(
                            "move /y {} {} >nul || exit /b 1",
                            batch_quote(from),
                            batch_quote(to)
                        ),
                        FileOperation::Remove { path } => {
                            format!("if exist {0} del /f /q {0} || exit /b 1", batch_quote(path))
                        }
                    });
                }
            }
        }

        let newline = match self {
            ScriptDialect::Posix => "\n",
            ScriptDialect::Batch => "\r\n",
        };
        let mut script = lines.join(newline);
        script.push_str(newline);
        script
    }

    fn unelevated_command(self, script: &Path) -> (String, Vec<String>) {
        let script = script.to_string_lossy().to_string();
        match self {
            ScriptDialect::Posix => ("/bin/sh".to_string(), vec![script]),
            ScriptDialect::Batch => ("cmd".to_string(), vec!["/C".to_string(), script]),
        }
    }
}

/// How a script is run with administrator rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// polkit's `pkexec`
    Pkexec,
    /// AppleScript `do shell script ... with administrator privileges`
    Osascript,
    /// PowerShell `Start-Process -Verb RunAs`
    RunAs,
}

impl Elevation {
    /// The elevation mechanism of the current platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            Elevation::RunAs
        } else if cfg!(target_os = "macos") {
            Elevation::Osascript
        } else {
            Elevation::Pkexec
        }
    }

    /// Program and arguments that run `script` elevated.
    pub fn command(self, script: &Path) -> (String, Vec<String>) {
        let script = script.to_string_lossy();
        match self {
            Elevation::Pkexec => (
                "pkexec".to_string(),
                vec!["/bin/sh".to_string(), script.to_string()],
            ),
            Elevation::Osascript => {
                let shell = format!("/bin/sh {}", sh_quote(Path::new(script.as_ref())));
                let apple = format!(
                    "do shell script \"{}\" with administrator privileges",
                    shell.replace('\\', "\\\\").replace('"', "\\\"")
                );
                ("osascript".to_string(), vec!["-e".to_string(), apple])
            }
            Elevation::RunAs => {
                let target = format!("\"{}\"", script).replace('\'', "''");
                let command = format!(
                    "$p = Start-Process -FilePath 'cmd.exe' -ArgumentList '/C', '{}' \
                     -Verb RunAs -Wait -PassThru; exit $p.ExitCode",
                    target
                );
                (
                    "powershell".to_string(),
                    vec![
                        "-NoProfile".to_string(),
                        "-NonInteractive".to_string(),
                        "-Command".to_string(),
                        command,
                    ],
                )
            }
        }
    }

    /// Whether a failed run means the user refused the privilege prompt.
    pub fn is_denial(self, output: &CommandOutput) -> bool {
        match self {
            Elevation::Pkexec => matches!(output.code, Some(126) | Some(127)),
            Elevation::Osascript => {
                output.stderr.contains("User canceled") || output.stderr.contains("(-128)")
            }
            Elevation::RunAs => output.stderr.contains("canceled by the user"),
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs.
///
/// Lets tests observe the commit command without spawning anything.
pub trait CommandRunner {
    /// Run `program` with `args`, wait for it, and capture its output.
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Runs commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// A batch of file operations committed as one script run.
#[derive(Debug)]
pub struct PatchTransaction {
    scratch: TempDir,
    operations: Vec<FileOperation>,
    dialect: ScriptDialect,
    elevation: Elevation,
}

impl PatchTransaction {
    /// Start a transaction with a fresh scratch directory.
    pub fn new() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| Error::Filesystem {
                message: format!("cannot create scratch directory: {}", e),
            })?;
        Ok(Self {
            scratch,
            operations: Vec::new(),
            dialect: ScriptDialect::native(),
            elevation: Elevation::native(),
        })
    }

    pub fn with_dialect(mut self, dialect: ScriptDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_elevation(mut self, elevation: Elevation) -> Self {
        self.elevation = elevation;
        self
    }

    /// Directory holding staged files and the commit script.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn operations(&self) -> &[FileOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn copy(&mut self, from: &Path, to: &Path) -> &mut Self {
        self.operations.push(FileOperation::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        self
    }

    pub fn move_file(&mut self, from: &Path, to: &Path) -> &mut Self {
        self.operations.push(FileOperation::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        self
    }

    pub fn remove(&mut self, path: &Path) -> &mut Self {
        self.operations.push(FileOperation::Remove {
            path: path.to_path_buf(),
        });
        self
    }

    /// Render `template` with `substitutions`, stage it, and queue it for
    /// `destination` as a [`FileOperation::RenderTemplate`].
    ///
    /// Substitutions apply in order, each replacing the first occurrence of
    /// its token (see [`render_text`]). The template is read now; a missing
    /// template fails here instead of at commit time.
    pub fn add_file_from_template(
        &mut self,
        template: &Path,
        destination: &Path,
        substitutions: &[(String, String)],
    ) -> Result<&mut Self> {
        let source = match fs::read_to_string(template) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::TemplateSourceMissing {
                    path: template.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let rendered = render_text(&source, substitutions);
        let staged = self.scratch.path().join(staged_name(destination));
        fs::write(&staged, rendered)?;

        self.operations.push(FileOperation::RenderTemplate {
            source: template.to_path_buf(),
            destination: destination.to_path_buf(),
            substitutions: substitutions.to_vec(),
            staged,
        });
        Ok(self)
    }

    /// The script `commit` would run.
    pub fn script(&self) -> String {
        self.dialect.render(self.scratch.path(), &self.operations)
    }

    /// Run every queued operation in one script invocation.
    ///
    /// With `elevated` set the script runs through the platform's privilege
    /// prompt. The scratch directory is removed whatever the outcome. An
    /// empty transaction runs nothing.
    pub fn commit(self, elevated: bool, runner: &dyn CommandRunner) -> Result<CommandOutput> {
        if self.operations.is_empty() {
            log::debug!("Nothing to commit");
            cleanup(self.scratch);
            return Ok(CommandOutput::default());
        }

        let result = self.run_script(elevated, runner);
        cleanup(self.scratch);
        result
    }

    fn run_script(&self, elevated: bool, runner: &dyn CommandRunner) -> Result<CommandOutput> {
        let script = self.script();
        let script_path = self.scratch.path().join(self.dialect.file_name());
        fs::write(&script_path, &script)?;
        log::debug!("Commit script {}:\n{}", script_path.display(), script);

        let (program, args) = if elevated {
            self.elevation.command(&script_path)
        } else {
            self.dialect.unelevated_command(&script_path)
        };
        log::info!(
            "Committing {} file operation(s) with {}{}",
            self.operations.len(),
            program,
            if elevated { " (elevated)" } else { "" }
        );

        let output = runner.run(&program, &args).map_err(|e| Error::TransactionFailed {
            code: None,
            stdout: String::new(),
            stderr: format!("cannot run {}: {}", program, e),
        })?;
        log::debug!("stdout: {}", output.stdout.trim_end());
        log::debug!("stderr: {}", output.stderr.trim_end());

        if output.success() {
            return Ok(output);
        }
        if elevated && self.elevation.is_denial(&output) {
            return Err(Error::ElevationDenied {
                message: first_line(&output.stderr)
                    .unwrap_or("the privilege prompt was dismissed")
                    .to_string(),
            });
        }
        Err(Error::TransactionFailed {
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Apply `substitutions` to `source` in order.
///
/// Each pair replaces only the first occurrence of its token in the text
/// produced by the previous pairs, so a later token may match text an
/// earlier replacement introduced. A token that does not occur is skipped.
pub fn render_text(source: &str, substitutions: &[(String, String)]) -> String {
    substitutions
        .iter()
        .fold(source.to_string(), |text, (token, replacement)| {
            if token.is_empty() {
                text
            } else {
                text.replacen(token.as_str(), replacement, 1)
            }
        })
}

fn staged_name(destination: &Path) -> String {
    let base = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    format!("{}---{}", base, Uuid::new_v4().simple())
}

fn cleanup(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("Failed to remove scratch directory {}: {}", path.display(), e);
        }
    }
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "'\\''"))
}

fn batch_quote(path: &Path) -> String {
    format!("\"{}\"", path.to_string_lossy().replace('%', "%%"))
}
