//! CLI command handlers
//!
//! This module contains the implementation of the `rtsweep` subcommands,
//! kept out of main.rs so they can be driven from tests.

pub mod fetch;
pub mod scan;
