//! Fetch command handler
//!
//! Handles `rtsweep fetch`, which dumps the file listing of one or more
//! repositories into a JSON file that `rtsweep scan` can read.

use anyhow::{Context, Result, bail};
use colored::*;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aql::AqlClient;
use crate::config::SweepConfig;
use crate::logging;

pub struct FetchOptions {
    pub config_file: PathBuf,
    pub output: PathBuf,
    pub repos: Vec<String>,
}

pub fn run(opts: &FetchOptions) -> Result<()> {
    let config = SweepConfig::load(&opts.config_file)?;
    logging::init(&config.log_level)?;

    let Some(rt) = config.artifactory.as_ref() else {
        bail!(
            "No 'artifactory' section in {}.\n\n\
            💡 Tip: add artifactory.url (and a token or {}) to fetch listings.",
            opts.config_file.display(),
            crate::config::TOKEN_ENV
        );
    };

    let repos = if opts.repos.is_empty() {
        rt.repositories.clone()
    } else {
        opts.repos.clone()
    };
    if repos.is_empty() {
        bail!(
            "No repositories to fetch.\n\n\
            💡 Tip: pass --repo <NAME> or set artifactory.repositories in the config."
        );
    }

    println!(
        "{} Fetching {} from {}",
        "⚡".yellow(),
        repos.join(", ").cyan(),
        rt.url
    );

    let client = AqlClient::new(
        &rt.url,
        config.token(),
        config.aql_page_size,
        Duration::from_secs(rt.timeout_secs),
    );
    let results = client.fetch_all(&repos)?;
    write_listing(&opts.output, &results)?;

    println!(
        "{} Wrote {} records to {}",
        "✓".green(),
        results.len(),
        opts.output.display()
    );
    Ok(())
}

/// Writes results in the same shape as an AQL response.
pub fn write_listing(path: &Path, results: &[Value]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(&json!({ "results": results }))?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
