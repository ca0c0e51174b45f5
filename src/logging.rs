//! Log output setup.
//!
//! Status lines go through `tracing` to stdout with a timestamp and level.
//! The level comes from `log_level` in the config file and accepts the
//! Python-style names used in existing configs (`WARNING`, `CRITICAL`).
//! `RUST_LOG` takes precedence when set.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        "OFF" => "off",
        _ => "info",
    }
}

pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rtsweep={}", level_directive(level))));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}
