//! JFrog CLI (`jf`) integration.
//!
//! Deletion itself is delegated to `jf rt del --spec <file>`. Failures are
//! reported and the run carries on with the next spec.

use colored::*;
use std::path::Path;
use std::process::Command;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Write file specs only
    ReportOnly,
    /// Invoke `jf` with `--dry-run`
    DryRun,
    /// Invoke `jf` and delete
    Execute,
}

impl DeleteMode {
    pub fn from_flags(execute: bool, dry_run: bool) -> Self {
        match (execute, dry_run) {
            (_, true) => DeleteMode::DryRun,
            (true, false) => DeleteMode::Execute,
            (false, false) => DeleteMode::ReportOnly,
        }
    }

    pub fn invokes_cli(&self) -> bool {
        !matches!(self, DeleteMode::ReportOnly)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Completed { stdout: String, stderr: String },
    Failed { code: Option<i32>, stdout: String, stderr: String },
    SpawnError(String),
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeleteOutcome::Completed { .. })
    }
}

pub struct JfCli {
    program: String,
}

impl JfCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for deleting everything in `spec`. `--quiet` skips the
    /// interactive confirmation prompt.
    pub fn delete_args(&self, spec: &Path, dry_run: bool) -> Vec<String> {
        let mut args = vec![
            "rt".to_string(),
            "del".to_string(),
            "--spec".to_string(),
            spec.display().to_string(),
            "--quiet".to_string(),
        ];
        if dry_run {
            args.push("--dry-run".to_string());
        }
        args
    }

    pub fn delete(&self, spec: &Path, dry_run: bool) -> DeleteOutcome {
        let args = self.delete_args(spec, dry_run);
        info!("Running: {} {}", self.program, args.join(" "));

        let output = match Command::new(&self.program).args(&args).output() {
            Ok(output) => output,
            Err(e) => {
                error!("Error running {}: {}", self.program, e);
                println!(
                    "{} Could not run '{}'. Is the JFrog CLI installed and on PATH?",
                    "x".red(),
                    self.program
                );
                return DeleteOutcome::SpawnError(e.to_string());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !stdout.is_empty() {
            info!("JFrog CLI output:\n{}", stdout);
        }
        if !stderr.is_empty() {
            // jf logs progress on stderr, so this alone is not a failure
            info!("JFrog CLI errors:\n{}", stderr);
        }

        if output.status.success() {
            println!("{} Deleted using {}", "✓".green(), spec.display());
            DeleteOutcome::Completed { stdout, stderr }
        } else {
            warn!(
                "{} exited with {} for {}",
                self.program,
                output.status,
                spec.display()
            );
            DeleteOutcome::Failed {
                code: output.status.code(),
                stdout,
                stderr,
            }
        }
    }
}
