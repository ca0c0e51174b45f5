//! JFrog CLI file specs.
//!
//! A file spec lists path patterns for `jf rt del --spec`:
//!
//! ```json
//! {
//!   "files": [
//!     { "pattern": "libs-snapshot/app/build_main_12_1234/**" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::classify::FolderSummary;
use crate::records::ArtifactRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub files: Vec<FilePattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePattern {
    pub pattern: String,
}

impl FileSpec {
    /// One recursive pattern per folder.
    pub fn for_folders(folders: &[FolderSummary]) -> Self {
        Self {
            files: folders
                .iter()
                .map(|f| FilePattern {
                    pattern: format!("{}/**", f.folder.trim_end_matches('/')),
                })
                .collect(),
        }
    }

    /// One exact pattern per file.
    pub fn for_files(records: &[&ArtifactRecord]) -> Self {
        Self {
            files: records
                .iter()
                .map(|r| FilePattern {
                    pattern: r.qualified_path(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Splits into specs of at most `size` patterns; `0` means no limit.
    pub fn chunks(&self, size: usize) -> Vec<FileSpec> {
        if size == 0 || self.len() <= size {
            return vec![self.clone()];
        }
        self.files
            .chunks(size)
            .map(|chunk| FileSpec {
                files: chunk.to_vec(),
            })
            .collect()
    }
}

/// Writes `spec` under `dir` as `<stem>.json`, or as numbered
/// `<stem>_partNNN.json` files when it exceeds `chunk_size`.
///
/// Returns the written paths; nothing is written for an empty spec.
pub fn write_file_specs(
    spec: &FileSpec,
    dir: &Path,
    stem: &str,
    chunk_size: usize,
) -> Result<Vec<PathBuf>> {
    if spec.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create file spec directory {}", dir.display()))?;

    let parts = spec.chunks(chunk_size);
    let mut written = Vec::with_capacity(parts.len());

    for (i, part) in parts.iter().enumerate() {
        let file_name = if parts.len() == 1 {
            format!("{}.json", stem)
        } else {
            format!("{}_part{:03}.json", stem, i + 1)
        };
        let path = dir.join(file_name);
        let content = serde_json::to_string_pretty(part)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write file spec {}", path.display()))?;
        info!("File spec written: {} ({} patterns)", path.display(), part.len());
        written.push(path);
    }

    Ok(written)
}
