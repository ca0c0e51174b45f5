//! Custom path cleanup.
//!
//! Independent of the build folder heuristic: every file under an explicit
//! path prefix that is older than the threshold is deleted individually.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::folders::is_protected;
use crate::records::{ArtifactRecord, DateField};

#[derive(Debug)]
pub enum TargetOutcome<'a> {
    /// The target itself lies under a protected path
    Protected,
    /// Files older than the threshold, oldest first
    Eligible(Vec<&'a ArtifactRecord>),
}

pub fn collect_target_files<'a>(
    records: &'a [ArtifactRecord],
    target: &str,
    protected_paths: &[String],
    threshold: DateTime<Utc>,
    date_field: DateField,
) -> TargetOutcome<'a> {
    if is_protected(target, protected_paths) {
        return TargetOutcome::Protected;
    }

    let mut eligible: Vec<&ArtifactRecord> = records
        .iter()
        .filter(|r| r.path.starts_with(target))
        .filter(|r| !is_protected(&format!("{}/", r.path), protected_paths))
        .filter(|r| r.date(date_field) < threshold)
        .collect();

    eligible.sort_by_key(|r| r.date(date_field));
    TargetOutcome::Eligible(eligible)
}

/// File-name friendly form of a target path.
pub fn target_slug(target: &str) -> String {
    target.replace('/', "_")
}

/// One slug per target. Targets that flatten to the same slug (`a/b` and
/// `a_b`) get `_2`, `_3`, ... so their file specs do not overwrite each other.
pub fn unique_slugs<S: AsRef<str>>(targets: &[S]) -> Vec<String> {
    let mut used = HashSet::new();
    targets
        .iter()
        .map(|target| {
            let base = target_slug(target.as_ref());
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{}_{}", base, n);
                n += 1;
            }
            slug
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn file(path: &str, name: &str, age_days: i64) -> ArtifactRecord {
        ArtifactRecord {
            repo: "generic".to_string(),
            path: path.to_string(),
            name: name.to_string(),
            size: 5,
            created: threshold() - TimeDelta::days(age_days),
            modified: Some(threshold() + TimeDelta::days(1)),
            updated: None,
        }
    }

    fn threshold() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_collects_old_files_under_prefix() {
        let records = vec![
            file("nightly/tmp", "new.zip", -3),
            file("nightly/tmp/a", "old.zip", 40),
            file("nightly/tmp", "older.zip", 400),
            file("nightly/keep", "other.zip", 400),
            file("nightly/tmp", "edge.zip", 0),
        ];

        let TargetOutcome::Eligible(files) =
            collect_target_files(&records, "nightly/tmp", &[], threshold(), DateField::Created)
        else {
            panic!("target should not be protected");
        };
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["older.zip", "old.zip"]);
    }

    #[test]
    fn test_protected_target_is_skipped() {
        let records = vec![file("release/1.0", "a.zip", 900)];
        let outcome = collect_target_files(
            &records,
            "release/1.0",
            &["release/".to_string()],
            threshold(),
            DateField::Created,
        );
        assert!(matches!(outcome, TargetOutcome::Protected));
    }

    #[test]
    fn test_protected_subpath_files_excluded() {
        let records = vec![
            file("nightly/keep", "a.zip", 900),
            file("nightly/drop", "b.zip", 900),
        ];
        let TargetOutcome::Eligible(files) = collect_target_files(
            &records,
            "nightly/",
            &["nightly/keep/".to_string()],
            threshold(),
            DateField::Created,
        ) else {
            panic!("target should not be protected");
        };
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "b.zip");
    }

    #[test]
    fn test_date_field_selection() {
        let records = vec![file("tmp", "a.zip", 900)];
        let TargetOutcome::Eligible(files) =
            collect_target_files(&records, "tmp", &[], threshold(), DateField::Modified)
        else {
            panic!("target should not be protected");
        };
        assert!(files.is_empty());
    }

    #[test]
    fn test_target_slug() {
        assert_eq!(target_slug("nightly/tmp/"), "nightly_tmp_");
    }

    #[test]
    fn test_unique_slugs_disambiguate_collisions() {
        let slugs = unique_slugs(&["a/b", "a_b", "c", "a_b_2", "a/b"]);
        assert_eq!(slugs, vec!["a_b", "a_b_2", "c", "a_b_2_2", "a_b_3"]);
    }
}
