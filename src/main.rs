//! # rtsweep CLI Entry Point
//!
//! This is the main executable for the `rtsweep` command-line tool.
//! It parses CLI arguments using clap and routes commands to the appropriate handlers.
//!
//! ## Command Structure
//!
//! - `scan`: classify the listing, write file specs, optionally delete
//! - `fetch`: download the listing through AQL
//! - `completion`: shell completion scripts

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use rtsweep::commands;
use rtsweep::commands::fetch::FetchOptions;
use rtsweep::commands::scan::{DEFAULT_REPO_FILE, ScanOptions};
use rtsweep::config::DEFAULT_CONFIG_FILE;
use rtsweep::jfrog::DeleteMode;
use rtsweep::records::DateField;
use rtsweep::ui;

#[derive(Parser)]
#[command(name = "rtsweep")]
#[command(about = "Clean up stale build folders in Artifactory", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find stale artifacts in a listing and write deletion file specs
    Scan {
        /// Path to the record listing
        #[arg(long = "json", default_value = DEFAULT_REPO_FILE)]
        repo_file: PathBuf,
        /// Path to the config YAML file
        #[arg(long = "config", default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,
        /// Which date decides the age of a file
        #[arg(long, value_enum, default_value_t = DateField::Created)]
        date_field: DateField,
        /// Run `jf rt del` with --dry-run for every file spec
        #[arg(long, conflicts_with = "execute")]
        dry_run: bool,
        /// Run `jf rt del` for every file spec
        #[arg(long)]
        execute: bool,
        /// Directory for the generated file specs
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Fetch the file listing of repositories through AQL
    Fetch {
        /// Path to the config YAML file
        #[arg(long = "config", default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,
        /// Output listing file
        #[arg(long, short, default_value = DEFAULT_REPO_FILE)]
        output: PathBuf,
        /// Repository to fetch (repeatable; overrides the config)
        #[arg(long = "repo")]
        repos: Vec<String>,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scan {
            repo_file,
            config_file,
            date_field,
            dry_run,
            execute,
            out_dir,
        }) => commands::scan::run(&ScanOptions {
            repo_file,
            config_file,
            date_field,
            mode: DeleteMode::from_flags(execute, dry_run),
            out_dir,
        }),

        Some(Commands::Fetch {
            config_file,
            output,
            repos,
        }) => commands::fetch::run(&FetchOptions {
            config_file,
            output,
            repos,
        }),

        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }

        None => {
            print_splash();
            Ok(())
        }
    }
}

fn print_splash() {
    println!();
    println!("   {}", "rtsweep".cyan().bold());
    println!(
        "   {}",
        "Stale build artifact cleanup for Artifactory".dimmed().italic()
    );
    println!("   {}", format!("v{}", env!("CARGO_PKG_VERSION")).green());
    println!();

    let mut table = ui::Table::new(&["Command", "Purpose"]);
    table.add_row(vec![
        "fetch".cyan().to_string(),
        "Dump repository listings through AQL".to_string(),
    ]);
    table.add_row(vec![
        "scan".cyan().to_string(),
        "Report stale folders and write file specs".to_string(),
    ]);
    table.add_row(vec![
        "scan --execute".cyan().to_string(),
        "Delete them with the JFrog CLI".to_string(),
    ]);
    table.print();
    println!();
    println!("   Run {} for detailed usage.", "rtsweep --help".white().bold());
    println!();
}
