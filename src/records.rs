//! Artifact record listing.
//!
//! A listing is the JSON dump of an AQL `items.find(...)` search:
//!
//! ```json
//! {"results": [{"repo": "libs-release", "path": "app/build_x_1_2", "name": "app.jar",
//!               "type": "file", "size": 1048576, "created": "2021-03-04T10:00:00.000Z"}]}
//! ```
//!
//! Only `file` entries are kept. Entries that cannot be understood are skipped
//! with a warning rather than failing the whole run.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Which timestamp decides the age of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DateField {
    #[default]
    Created,
    Modified,
    Updated,
}

impl DateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateField::Created => "created",
            DateField::Modified => "modified",
            DateField::Updated => "updated",
        }
    }
}

/// Errors for a single listing entry.
#[derive(Debug)]
pub enum RecordError {
    /// Entry is not a JSON object
    NotAnObject(String),
    /// Required field missing or of the wrong type
    Invalid(serde_json::Error),
    /// Timestamp in an unknown format
    BadTimestamp(String),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::NotAnObject(raw) => write!(f, "not an object: {}", raw),
            RecordError::Invalid(e) => write!(f, "invalid record: {}", e),
            RecordError::BadTimestamp(raw) => write!(f, "unparseable timestamp '{}'", raw),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Invalid(e)
    }
}

/// A single file stored in the artifact repository.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRecord {
    pub repo: String,
    pub path: String,
    pub name: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    repo: String,
    path: String,
    name: String,
    size: u64,
    created: String,
    modified: Option<String>,
    updated: Option<String>,
}

impl ArtifactRecord {
    /// Only `created` is mandatory. A bad `modified` or `updated` value is
    /// dropped so the record falls back to `created` for that field.
    fn from_raw(raw: RawRecord) -> Result<Self, RecordError> {
        let created = parse_timestamp(&raw.created)?;
        let optional = |field: &str, value: Option<String>| {
            let value = value?;
            match parse_timestamp(&value) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    warn!(
                        "Ignoring {} of {}: {}",
                        field,
                        join_path(&raw.repo, &join_path(&raw.path, &raw.name)),
                        e
                    );
                    None
                }
            }
        };

        Ok(Self {
            created,
            modified: optional("modified", raw.modified),
            updated: optional("updated", raw.updated),
            repo: raw.repo,
            path: raw.path,
            name: raw.name,
            size: raw.size,
        })
    }

    /// `path/name`, without a leading `./` for repository-root files.
    pub fn full_path(&self) -> String {
        join_path(&self.path, &self.name)
    }

    /// `repo/path/name`
    pub fn qualified_path(&self) -> String {
        join_path(&self.repo, &self.full_path())
    }

    /// Timestamp for `field`; falls back to `created` when the field is absent.
    pub fn date(&self, field: DateField) -> DateTime<Utc> {
        match field {
            DateField::Created => self.created,
            DateField::Modified => self.modified.unwrap_or(self.created),
            DateField::Updated => self.updated.unwrap_or(self.created),
        }
    }
}

/// Joins repository path segments the way the listing expects them.
pub fn join_path(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() || base == "." {
        rest.to_string()
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, rest.trim_start_matches('/'))
    }
}

/// Parses the timestamp formats Artifactory emits.
///
/// Accepts RFC 3339 (`2023-01-05T10:00:00.000Z`, `...+02:00`), compact offsets
/// (`...+0200`) and offset-less values, which are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RecordError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| RecordError::BadTimestamp(value.to_string()))
}

/// File records from a listing plus bookkeeping about what was dropped.
#[derive(Debug, Default)]
pub struct Listing {
    pub records: Vec<ArtifactRecord>,
    /// Folder and other non-file entries
    pub ignored: usize,
    /// Malformed entries
    pub skipped: usize,
    /// `(repo, path)` of skipped file entries whose location is still known
    pub unreadable: Vec<(String, String)>,
}

pub fn load_listing(path: &Path) -> Result<Listing> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read record listing {}", path.display()))?;
    parse_listing(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_listing(content: &str) -> Result<Listing> {
    let root: Value = serde_json::from_str(content).context("Record listing is not valid JSON")?;

    let entries = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => bail!("Record listing has no \"results\" array"),
        },
        _ => bail!("Record listing must be an object with \"results\" or an array"),
    };

    let mut listing = Listing::default();
    for entry in entries {
        let Value::Object(ref map) = entry else {
            warn!("Skipping invalid entry: {}", RecordError::NotAnObject(entry.to_string()));
            listing.skipped += 1;
            continue;
        };

        if map.get("type").and_then(Value::as_str) != Some("file") {
            listing.ignored += 1;
            continue;
        }

        let parsed = serde_json::from_value::<RawRecord>(entry.clone())
            .map_err(RecordError::from)
            .and_then(ArtifactRecord::from_raw);

        match parsed {
            Ok(record) => listing.records.push(record),
            Err(e) => {
                warn!("Skipping invalid entry {}: {}", entry, e);
                listing.skipped += 1;
                if let (Some(repo), Some(path)) = (
                    map.get("repo").and_then(Value::as_str),
                    map.get("path").and_then(Value::as_str),
                ) {
                    listing.unreadable.push((repo.to_string(), path.to_string()));
                }
            }
        }
    }

    debug!(
        "Listing parsed: {} files, {} ignored, {} skipped",
        listing.records.len(),
        listing.ignored,
        listing.skipped
    );
    Ok(listing)
}
