//! Build folder heuristic.
//!
//! CI jobs publish each build under a folder named like
//! `build_<job>_<number>_<attempt>`. Every file is attributed to the outermost
//! such folder found in its path; files outside any build folder stay grouped
//! under their own directory.
//!
//! A grouped folder is only considered a build folder when its name also ends
//! with one of the configured suffix patterns (`_a`, a four digit id, or an
//! eleven character hash by default).

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::records::{ArtifactRecord, join_path};

pub const DEFAULT_GROUP_PATTERN: &str = r"(.*?/)?(?P<folder>build_[^/]+_\d+_\d+)(/.*)?$";

pub const DEFAULT_MATCH_PATTERNS: [&str; 3] = [r"_a$", r"_[1-9]{4}$", r"_[a-z1-9]{11}$"];

pub struct BuildFolderMatcher {
    group: Regex,
    patterns: Vec<Regex>,
}

impl BuildFolderMatcher {
    /// `group_pattern` locates the build folder inside a path, through a capture
    /// named `folder` or, failing that, the second capture group.
    pub fn new<S: AsRef<str>>(group_pattern: &str, match_patterns: &[S]) -> Result<Self> {
        let group = Regex::new(group_pattern)
            .with_context(|| format!("Invalid build folder group pattern '{}'", group_pattern))?;

        let patterns = match_patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref())
                    .with_context(|| format!("Invalid build folder match pattern '{}'", p.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { group, patterns })
    }

    /// Path prefix ending with the matched build folder, or `path` itself when
    /// no build folder is present.
    pub fn build_folder<'a>(&self, path: &'a str) -> &'a str {
        self.group
            .captures(path)
            .and_then(|caps| caps.name("folder").or_else(|| caps.get(2)))
            .map(|folder| &path[..folder.end()])
            .unwrap_or(path)
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_GROUP_PATTERN, &DEFAULT_MATCH_PATTERNS)
    }

    pub fn is_build_folder(&self, folder: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(folder))
    }
}

pub fn is_protected(path: &str, protected_paths: &[String]) -> bool {
    protected_paths
        .iter()
        .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
}

/// A build folder within one repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FolderKey {
    pub repo: String,
    pub folder: String,
}

impl FolderKey {
    /// `repo/folder`
    pub fn qualified(&self) -> String {
        join_path(&self.repo, &self.folder)
    }

    /// Protected when either the repository-relative or the qualified folder
    /// path falls under a protected prefix.
    pub fn is_protected(&self, protected_paths: &[String]) -> bool {
        is_protected(&format!("{}/", self.folder), protected_paths)
            || is_protected(&format!("{}/", self.qualified()), protected_paths)
    }
}

pub type FolderGroups<'a> = BTreeMap<FolderKey, Vec<&'a ArtifactRecord>>;

pub fn group_by_build_folder<'a>(
    records: &'a [ArtifactRecord],
    matcher: &BuildFolderMatcher,
) -> FolderGroups<'a> {
    let mut groups: FolderGroups<'a> = BTreeMap::new();
    for record in records {
        let key = FolderKey {
            repo: record.repo.clone(),
            folder: matcher.build_folder(&record.path).to_string(),
        };
        groups.entry(key).or_default().push(record);
    }
    groups
}

/// Build folders holding entries that could not be parsed. Their age is
/// unknown, so they must never be reported as fully stale.
pub fn unreadable_folders(
    entries: &[(String, String)],
    matcher: &BuildFolderMatcher,
) -> BTreeSet<FolderKey> {
    entries
        .iter()
        .map(|(repo, path)| FolderKey {
            repo: repo.clone(),
            folder: matcher.build_folder(path).to_string(),
        })
        .collect()
}
