//! # rtsweep - Stale Build Artifact Cleanup
//!
//! rtsweep finds build output in an Artifactory repository that has outlived
//! its retention window and hands it to the JFrog CLI for deletion.
//!
//! ## Features
//!
//! - **Build Folder Heuristic**: Groups files into per-build folders by path pattern
//! - **All-or-Nothing Folders**: A folder is deleted only when every file is past the threshold
//! - **Custom Targets**: Deletes old files under explicit path prefixes
//! - **Protected Paths**: Prefixes that are never touched
//! - **File Specs**: Writes `jf rt del --spec` manifests, optionally chunked
//! - **AQL Fetch**: Pages through the search API to produce the listing
//!
//! ## Quick Start
//!
//! ```bash
//! # Dump the listing of a repository
//! rtsweep fetch --repo libs-snapshot
//!
//! # Report what would be deleted, then delete it
//! rtsweep scan
//! rtsweep scan --execute
//! ```
//!
//! ## Module Organization
//!
//! - [`records`] - Listing parsing and timestamps
//! - [`folders`] - Build folder grouping and protection
//! - [`classify`] - Stale/fresh folder verdicts
//! - [`targets`] - Custom path cleanup
//! - [`filespec`] - JFrog CLI file spec output
//! - [`commands`] - CLI command handlers

/// Remote listing through the AQL search API.
pub mod aql;

/// Stale build folder classification.
pub mod classify;

/// CLI command handlers extracted from main.
pub mod commands;

/// Configuration file parsing (`jfrog_cleanup_config.yaml`).
pub mod config;

/// JFrog CLI file specs.
pub mod filespec;

/// Build folder grouping heuristic.
pub mod folders;

/// External `jf` invocation.
pub mod jfrog;

/// Log output setup.
pub mod logging;

/// Artifact record listing.
pub mod records;

/// Deletion candidate reports.
pub mod report;

/// Custom path cleanup.
pub mod targets;

/// Terminal UI utilities (tables, sizes).
pub mod ui;
