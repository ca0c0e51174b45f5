//! Stale build folder classification.
//!
//! A build folder is deleted as a whole or not at all: one file dated after
//! the threshold keeps every file in the folder.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::folders::{BuildFolderMatcher, FolderGroups, FolderKey};
use crate::records::{ArtifactRecord, DateField};
use crate::ui::bytes_to_mb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every file is at or before the threshold
    Stale,
    /// At least one file is newer than the threshold, or could not be read
    Fresh,
}

#[derive(Debug, Clone)]
pub struct FolderSummary {
    /// `repo/path/to/build_folder`
    pub folder: String,
    pub file_count: usize,
    pub total_size: u64,
    pub oldest: DateTime<Utc>,
    pub newest: DateTime<Utc>,
    pub oldest_file: String,
    pub newest_file: String,
    /// Whole days from the oldest file to the threshold (negative when newer)
    pub oldest_days: i64,
    pub newest_days: i64,
    pub verdict: Verdict,
    pub reason: String,
}

impl FolderSummary {
    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.total_size)
    }
}

pub struct ClassifyOptions<'a> {
    pub protected_paths: &'a [String],
    pub threshold: DateTime<Utc>,
    pub threshold_days: i64,
    pub date_field: DateField,
    /// Folders with unparseable entries; never classified as stale
    pub incomplete: &'a BTreeSet<FolderKey>,
}

#[derive(Debug, Default)]
pub struct Classification {
    pub to_delete: Vec<FolderSummary>,
    pub retained: Vec<FolderSummary>,
    pub protected: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeletionSummary {
    pub folders: usize,
    pub files: usize,
    pub total_size: u64,
}

impl Classification {
    pub fn summary(&self) -> DeletionSummary {
        DeletionSummary {
            folders: self.to_delete.len(),
            files: self.to_delete.iter().map(|f| f.file_count).sum(),
            total_size: self.to_delete.iter().map(|f| f.total_size).sum(),
        }
    }
}

/// Whole days between `later` and `earlier`, rounded toward negative infinity.
pub fn days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    let diff = later - earlier;
    let days = diff.num_days();
    match TimeDelta::try_days(days) {
        Some(whole) if diff < whole => days - 1,
        _ => days,
    }
}

pub fn classify_folders(
    groups: &FolderGroups<'_>,
    matcher: &BuildFolderMatcher,
    opts: &ClassifyOptions<'_>,
) -> Classification {
    let mut result = Classification::default();

    for (key, files) in groups {
        if key.is_protected(opts.protected_paths) {
            debug!("Skipping protected folder {}", key.qualified());
            result.protected += 1;
            continue;
        }
        if !matcher.is_build_folder(&key.folder) {
            result.unmatched += 1;
            continue;
        }

        let Some(mut summary) = summarize(&key.qualified(), files, opts) else {
            continue;
        };
        if summary.verdict == Verdict::Stale && opts.incomplete.contains(key) {
            warn!("Retaining {}: some entries could not be read", summary.folder);
            summary.verdict = Verdict::Fresh;
            summary.reason = "Some files could not be read.".to_string();
        }
        info!(
            "Processing folder: {} ({} files, {:?})",
            summary.folder, summary.file_count, summary.verdict
        );
        match summary.verdict {
            Verdict::Stale => result.to_delete.push(summary),
            Verdict::Fresh => result.retained.push(summary),
        }
    }

    result
}

fn summarize(
    folder: &str,
    files: &[&ArtifactRecord],
    opts: &ClassifyOptions<'_>,
) -> Option<FolderSummary> {
    let first = files.first()?;
    let mut oldest = (first.date(opts.date_field), *first);
    let mut newest = oldest;
    let mut total_size = 0u64;
    let mut all_older = true;

    for file in files {
        let date = file.date(opts.date_field);
        if date < oldest.0 {
            oldest = (date, *file);
        }
        if date > newest.0 {
            newest = (date, *file);
        }
        total_size += file.size;
        if date > opts.threshold {
            all_older = false;
        }
    }

    let (verdict, reason) = if all_older {
        (
            Verdict::Stale,
            format!("All files older than {} days.", opts.threshold_days),
        )
    } else {
        (
            Verdict::Fresh,
            format!("Some files are newer than {} days.", opts.threshold_days),
        )
    };

    Some(FolderSummary {
        folder: folder.to_string(),
        file_count: files.len(),
        total_size,
        oldest: oldest.0,
        newest: newest.0,
        oldest_file: oldest.1.name.clone(),
        newest_file: newest.1.name.clone(),
        oldest_days: days_between(opts.threshold, oldest.0),
        newest_days: days_between(opts.threshold, newest.0),
        verdict,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::{group_by_build_folder, unreadable_folders};
    use crate::records::parse_listing;
    use chrono::TimeZone;

    fn file(path: &str, name: &str, created: DateTime<Utc>, size: u64) -> ArtifactRecord {
        ArtifactRecord {
            repo: "libs".to_string(),
            path: path.to_string(),
            name: name.to_string(),
            size,
            created,
            modified: None,
            updated: None,
        }
    }

    fn threshold() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn run(records: &[ArtifactRecord], protected: &[String]) -> Classification {
        run_with_unreadable(records, protected, &[])
    }

    fn run_with_unreadable(
        records: &[ArtifactRecord],
        protected: &[String],
        unreadable: &[(String, String)],
    ) -> Classification {
        let matcher = BuildFolderMatcher::with_defaults().unwrap();
        let groups = group_by_build_folder(records, &matcher);
        let incomplete = unreadable_folders(unreadable, &matcher);
        classify_folders(
            &groups,
            &matcher,
            &ClassifyOptions {
                protected_paths: protected,
                threshold: threshold(),
                threshold_days: 730,
                date_field: DateField::Created,
                incomplete: &incomplete,
            },
        )
    }

    #[test]
    fn test_days_between_floors() {
        let t = threshold();
        assert_eq!(days_between(t, t - TimeDelta::days(3)), 3);
        assert_eq!(days_between(t, t - TimeDelta::hours(36)), 1);
        assert_eq!(days_between(t, t + TimeDelta::hours(1)), -1);
        assert_eq!(days_between(t, t + TimeDelta::days(2)), -2);
        assert_eq!(days_between(t, t), 0);
    }

    #[test]
    fn test_all_old_folder_is_stale() {
        let t = threshold();
        let records = vec![
            file("app/build_x_1_2345", "a.jar", t - TimeDelta::days(10), 1024 * 1024),
            file("app/build_x_1_2345/lib", "b.so", t - TimeDelta::days(400), 2 * 1024 * 1024),
            file("app/build_x_1_2345", "c.txt", t, 0),
        ];
        let result = run(&records, &[]);

        assert_eq!(result.to_delete.len(), 1);
        assert!(result.retained.is_empty());
        let folder = &result.to_delete[0];
        assert_eq!(folder.folder, "libs/app/build_x_1_2345");
        assert_eq!(folder.file_count, 3);
        assert_eq!(folder.oldest_file, "b.so");
        assert_eq!(folder.newest_file, "c.txt");
        assert_eq!(folder.oldest_days, 400);
        assert_eq!(folder.newest_days, 0);
        assert_eq!(folder.size_mb(), 3.0);
        assert_eq!(folder.reason, "All files older than 730 days.");
    }

    #[test]
    fn test_one_fresh_file_retains_folder() {
        let t = threshold();
        let records = vec![
            file("app/build_x_1_2345", "a.jar", t - TimeDelta::days(900), 10),
            file("app/build_x_1_2345", "b.jar", t + TimeDelta::seconds(1), 10),
        ];
        let result = run(&records, &[]);

        assert!(result.to_delete.is_empty());
        assert_eq!(result.retained.len(), 1);
        assert_eq!(result.retained[0].verdict, Verdict::Fresh);
        assert_eq!(result.retained[0].reason, "Some files are newer than 730 days.");
        assert_eq!(result.retained[0].newest_days, -1);
    }

    #[test]
    fn test_protected_and_unmatched_folders_skipped() {
        let t = threshold();
        let records = vec![
            file("keep/build_x_1_2345", "a.jar", t - TimeDelta::days(900), 10),
            file("app/build_x_1_2", "b.jar", t - TimeDelta::days(900), 10),
            file("misc/tools_a", "c.jar", t - TimeDelta::days(900), 10),
        ];
        let result = run(&records, &["keep/".to_string()]);

        assert_eq!(result.protected, 1);
        assert_eq!(result.unmatched, 1);
        assert_eq!(result.to_delete.len(), 1);
        assert_eq!(result.to_delete[0].folder, "libs/misc/tools_a");
    }

    #[test]
    fn test_summary_totals() {
        let t = threshold();
        let records = vec![
            file("a/build_x_1_2345", "1", t - TimeDelta::days(900), 100),
            file("a/build_x_1_2345", "2", t - TimeDelta::days(900), 100),
            file("b/build_y_2_6789", "3", t - TimeDelta::days(900), 300),
        ];
        let summary = run(&records, &[]).summary();
        assert_eq!(
            summary,
            DeletionSummary {
                folders: 2,
                files: 3,
                total_size: 500
            }
        );
    }

    #[test]
    fn test_folder_with_unreadable_entry_is_retained() {
        let json = r#"[
            {"repo": "libs", "path": "app/build_x_1_2345", "name": "old.jar", "type": "file",
             "size": 1, "created": "2019-01-01T00:00:00.000Z"},
            {"repo": "libs", "path": "app/build_x_1_2345", "name": "fresh.jar", "type": "file",
             "size": 1, "created": "2025-12-01T00:00:00.000Z", "updated": "n/a"}
        ]"#;
        let listing = parse_listing(json).unwrap();
        let result = run(&listing.records, &[]);

        assert!(result.to_delete.is_empty());
        assert_eq!(result.retained.len(), 1);
        assert_eq!(result.retained[0].file_count, 2);
    }

    #[test]
    fn test_unparseable_created_keeps_folder() {
        let json = r#"[
            {"repo": "libs", "path": "app/build_x_1_2345", "name": "old.jar", "type": "file",
             "size": 1, "created": "2019-01-01T00:00:00.000Z"},
            {"repo": "libs", "path": "app/build_x_1_2345/lib", "name": "mystery.jar",
             "type": "file", "size": 1, "created": "soon"},
            {"repo": "libs", "path": "app/build_y_2_6789", "name": "gone.jar", "type": "file",
             "size": 1, "created": "2019-01-01T00:00:00.000Z"}
        ]"#;
        let listing = parse_listing(json).unwrap();
        assert_eq!(listing.skipped, 1);

        let result = run_with_unreadable(&listing.records, &[], &listing.unreadable);

        assert_eq!(result.to_delete.len(), 1);
        assert_eq!(result.to_delete[0].folder, "libs/app/build_y_2_6789");
        assert_eq!(result.retained.len(), 1);
        assert_eq!(result.retained[0].folder, "libs/app/build_x_1_2345");
        assert_eq!(result.retained[0].verdict, Verdict::Fresh);
        assert_eq!(result.retained[0].reason, "Some files could not be read.");
    }
}
