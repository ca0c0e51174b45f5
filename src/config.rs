//! Cleanup configuration (`jfrog_cleanup_config.yaml`).
//!
//! ```yaml
//! protected_paths:
//!   - release/
//! time_threshold_days: 730
//! log_level: INFO
//! cleanup_target_paths:
//!   - nightly/tmp/
//! artifactory:
//!   url: https://example.jfrog.io/artifactory
//!   repositories: [libs-snapshot]
//! aql_page_size: 1000
//! build_folder:
//!   group_pattern: '(.*?/)?(?P<folder>build_[^/]+_\d+_\d+)(/.*)?$'
//!   match_patterns: ['_a$', '_[1-9]{4}$', '_[a-z1-9]{11}$']
//! delete_chunk_size: 500
//! ```

use anyhow::{Context, Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::folders::{BuildFolderMatcher, DEFAULT_GROUP_PATTERN, DEFAULT_MATCH_PATTERNS};

pub const DEFAULT_CONFIG_FILE: &str = "jfrog_cleanup_config.yaml";
pub const TOKEN_ENV: &str = "RTSWEEP_TOKEN";

#[derive(Deserialize, Debug)]
pub struct SweepConfig {
    #[serde(default)]
    pub protected_paths: Vec<String>,
    #[serde(default = "default_threshold_days")]
    pub time_threshold_days: i64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub cleanup_target_paths: Vec<String>,
    pub artifactory: Option<ArtifactoryConfig>,
    #[serde(default = "default_page_size")]
    pub aql_page_size: usize,
    #[serde(default)]
    pub build_folder: BuildFolderConfig,
    /// Maximum patterns per file spec; 0 keeps everything in one file.
    #[serde(default)]
    pub delete_chunk_size: usize,
    #[serde(default = "default_jf_cli")]
    pub jf_cli: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ArtifactoryConfig {
    pub url: String,
    pub token: Option<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BuildFolderConfig {
    #[serde(default = "default_group_pattern")]
    pub group_pattern: String,
    #[serde(default = "default_match_patterns")]
    pub match_patterns: Vec<String>,
}

impl Default for BuildFolderConfig {
    fn default() -> Self {
        Self {
            group_pattern: default_group_pattern(),
            match_patterns: default_match_patterns(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            protected_paths: Vec::new(),
            time_threshold_days: default_threshold_days(),
            log_level: default_log_level(),
            cleanup_target_paths: Vec::new(),
            artifactory: None,
            aql_page_size: default_page_size(),
            build_folder: BuildFolderConfig::default(),
            delete_chunk_size: 0,
            jf_cli: default_jf_cli(),
        }
    }
}

fn default_threshold_days() -> i64 {
    730
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_page_size() -> usize {
    1000
}

fn default_jf_cli() -> String {
    "jf".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_group_pattern() -> String {
    DEFAULT_GROUP_PATTERN.to_string()
}

fn default_match_patterns() -> Vec<String> {
    DEFAULT_MATCH_PATTERNS.iter().map(|s| s.to_string()).collect()
}

impl SweepConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "{} not found.\n\n\
                💡 Tip: pass --config <FILE> or create {} in the current directory.",
                path.display(),
                DEFAULT_CONFIG_FILE
            ));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SweepConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML (check indentation and quoting)")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.time_threshold_days < 0 {
            bail!("time_threshold_days must not be negative (got {})", self.time_threshold_days);
        }
        if TimeDelta::try_days(self.time_threshold_days).is_none() {
            bail!("time_threshold_days {} is out of range", self.time_threshold_days);
        }
        if self.aql_page_size == 0 {
            bail!("aql_page_size must be greater than zero");
        }
        if self.jf_cli.trim().is_empty() {
            bail!("jf_cli must name an executable");
        }
        self.matcher()?;
        Ok(())
    }

    /// Files dated strictly after this instant keep their folder alive.
    pub fn threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = TimeDelta::try_days(self.time_threshold_days).unwrap_or(TimeDelta::zero());
        now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn matcher(&self) -> Result<BuildFolderMatcher> {
        BuildFolderMatcher::new(
            &self.build_folder.group_pattern,
            &self.build_folder.match_patterns,
        )
    }

    /// Access token from the environment, then from the config file.
    pub fn token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.artifactory.as_ref().and_then(|a| a.token.clone()))
    }
}
