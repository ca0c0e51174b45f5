//! Scan command handler
//!
//! Handles `rtsweep scan`: custom target cleanup first, then build folder
//! cleanup, each writing file specs and optionally handing them to `jf`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::classify::{Classification, ClassifyOptions, classify_folders};
use crate::config::SweepConfig;
use crate::filespec::{FileSpec, write_file_specs};
use crate::folders::{group_by_build_folder, unreadable_folders};
use crate::jfrog::{DeleteMode, JfCli};
use crate::logging;
use crate::records::{self, ArtifactRecord, DateField, Listing};
use crate::report;
use crate::targets::{TargetOutcome, collect_target_files, unique_slugs};

pub const DEFAULT_REPO_FILE: &str = "repo_files.json";
pub const FOLDER_SPEC_STEM: &str = "folders_to_delete_spec";

const RULE_WIDE: usize = 120;
const RULE_NARROW: usize = 80;

pub struct ScanOptions {
    pub repo_file: PathBuf,
    pub config_file: PathBuf,
    pub date_field: DateField,
    pub mode: DeleteMode,
    pub out_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub target_specs: Vec<PathBuf>,
    pub folder_specs: Vec<PathBuf>,
    pub classification: Classification,
    pub failed_deletes: usize,
}

/// Entry point for `rtsweep scan`.
pub fn run(opts: &ScanOptions) -> Result<()> {
    let config = SweepConfig::load(&opts.config_file)?;
    logging::init(&config.log_level)?;

    let report = scan(&config, opts, Utc::now())?;

    if opts.mode == DeleteMode::ReportOnly {
        println!();
        println!(
            "{} Report only. Re-run with {} to delete or {} to preview with jf.",
            "ℹ".blue(),
            "--execute".bold(),
            "--dry-run".bold()
        );
    } else if report.failed_deletes > 0 {
        println!(
            "{} {} file spec(s) could not be processed by {}",
            "!".yellow(),
            report.failed_deletes,
            config.jf_cli
        );
    }
    Ok(())
}

pub fn scan(config: &SweepConfig, opts: &ScanOptions, now: DateTime<Utc>) -> Result<ScanReport> {
    let threshold = config.threshold(now);

    info!("Starting artifact cleanup");
    info!("Threshold (days): {}", config.time_threshold_days);
    info!("Protected paths: {:?}", config.protected_paths);
    info!("Threshold date (UTC): {}", threshold.format("%Y-%m-%d %H:%M:%S UTC"));
    info!("Current date (UTC): {}", now.format("%Y-%m-%d %H:%M:%S UTC"));
    info!("Date field: {}", opts.date_field.as_str());

    let listing = records::load_listing(&opts.repo_file)?;
    info!(
        "Loaded {} file records from {} ({} non-file entries ignored, {} invalid entries skipped)",
        listing.records.len(),
        opts.repo_file.display(),
        listing.ignored,
        listing.skipped
    );

    let jf = JfCli::new(&config.jf_cli);
    let mut report = ScanReport::default();

    if !config.cleanup_target_paths.is_empty() {
        sweep_targets(config, &listing.records, opts, threshold, now, &jf, &mut report)?;
    }
    info!("{}", "=".repeat(RULE_WIDE));

    sweep_build_folders(config, &listing, opts, threshold, &jf, &mut report)?;
    Ok(report)
}

fn sweep_targets(
    config: &SweepConfig,
    records: &[ArtifactRecord],
    opts: &ScanOptions,
    threshold: DateTime<Utc>,
    now: DateTime<Utc>,
    jf: &JfCli,
    report: &mut ScanReport,
) -> Result<()> {
    let stamp = now.format("%Y%m%d_%H%M%S").to_string();
    let spec_dir = opts.out_dir.join(format!("fileSpec_{}", stamp));

    info!("{}", "-".repeat(RULE_WIDE));
    info!(
        "Delete files from paths: {:?} which are older than {}",
        config.cleanup_target_paths,
        threshold.format("%Y-%m-%d %H:%M:%S UTC")
    );
    info!("{}", "-".repeat(RULE_WIDE));

    let slugs = unique_slugs(&config.cleanup_target_paths);
    for (target, slug) in config.cleanup_target_paths.iter().zip(&slugs) {
        info!("{}", "=".repeat(RULE_NARROW));
        info!("Processing target path: {}", target);
        info!("{}", "=".repeat(RULE_NARROW));

        let files = match collect_target_files(
            records,
            target,
            &config.protected_paths,
            threshold,
            opts.date_field,
        ) {
            TargetOutcome::Protected => {
                info!("Skipping protected path: {}", target);
                continue;
            }
            TargetOutcome::Eligible(files) => files,
        };

        report::print_file_report(target, &files, opts.date_field);

        let stem = format!("filespec_{}_{}", slug, stamp);
        let written = write_file_specs(
            &FileSpec::for_files(&files),
            &spec_dir,
            &stem,
            config.delete_chunk_size,
        )?;
        report.failed_deletes += run_deletes(jf, &written, opts.mode);
        report.target_specs.extend(written);
    }
    Ok(())
}

fn sweep_build_folders(
    config: &SweepConfig,
    listing: &Listing,
    opts: &ScanOptions,
    threshold: DateTime<Utc>,
    jf: &JfCli,
    report: &mut ScanReport,
) -> Result<()> {
    let matcher = config.matcher()?;
    let groups = group_by_build_folder(&listing.records, &matcher);
    let incomplete = unreadable_folders(&listing.unreadable, &matcher);

    info!("{}", "-".repeat(RULE_WIDE));
    info!("Deleting folders which match the build folder pattern...");
    info!("Total build folders found: {}", groups.len());
    info!("Processing build folders for deletion criteria...");

    let classification = classify_folders(
        &groups,
        &matcher,
        &ClassifyOptions {
            protected_paths: &config.protected_paths,
            threshold,
            threshold_days: config.time_threshold_days,
            date_field: opts.date_field,
            incomplete: &incomplete,
        },
    );
    info!(
        "{} protected and {} non-matching folders skipped",
        classification.protected, classification.unmatched
    );

    report::print_folder_report("Folders to be deleted", &classification.to_delete);
    report::print_folder_report("Folders NOT selected for deletion", &classification.retained);

    if !classification.to_delete.is_empty() {
        report::print_summary(&classification.summary());

        let written = write_file_specs(
            &FileSpec::for_folders(&classification.to_delete),
            &opts.out_dir,
            FOLDER_SPEC_STEM,
            config.delete_chunk_size,
        )?;
        report.failed_deletes += run_deletes(jf, &written, opts.mode);
        report.folder_specs = written;
    }

    report.classification = classification;
    Ok(())
}

/// Hands each spec to `jf`; returns how many did not complete.
fn run_deletes(jf: &JfCli, specs: &[PathBuf], mode: DeleteMode) -> usize {
    if !mode.invokes_cli() {
        return 0;
    }
    specs
        .iter()
        .filter(|spec| !delete_one(jf, spec, mode))
        .count()
}

fn delete_one(jf: &JfCli, spec: &Path, mode: DeleteMode) -> bool {
    let outcome = jf.delete(spec, mode == DeleteMode::DryRun);
    if !outcome.is_success() {
        warn!("Deletion with {} did not complete", spec.display());
    }
    outcome.is_success()
}
