//! Human readable reports for deletion candidates.

use colored::*;
use std::collections::BTreeSet;

use crate::classify::{DeletionSummary, FolderSummary};
use crate::records::{ArtifactRecord, DateField};
use crate::ui::{Table, format_mb};

const DISPLAY_DATE: &str = "%Y-%m-%d %H:%M:%S";

/// Table of individual files, oldest first.
pub fn file_table(files: &[&ArtifactRecord], date_field: DateField) -> Table {
    let mut sorted = files.to_vec();
    sorted.sort_by_key(|f| f.date(date_field));

    let date_header = match date_field {
        DateField::Created => "Created",
        DateField::Modified => "Modified",
        DateField::Updated => "Updated",
    };
    let mut table = Table::new(&["S.No", "Full Path", "File Name", date_header, "Size (MB)"]);
    for (i, f) in sorted.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            f.full_path(),
            f.name.clone(),
            f.date(date_field).format(DISPLAY_DATE).to_string(),
            format_mb(f.size),
        ]);
    }
    table
}

pub fn print_file_report(title: &str, files: &[&ArtifactRecord], date_field: DateField) {
    println!();
    println!("Files eligible for deletion under: {}", title.bold());
    if !files.is_empty() {
        file_table(files, date_field).print();
    }
    let total: u64 = files.iter().map(|f| f.size).sum();
    println!("Total files to be deleted: {}", files.len());
    println!("Total space to be freed: {} MB", format_mb(total));
}

/// Folder table sorted by size, largest first.
///
/// When all rows share one reason it is returned separately instead of being
/// repeated in a column.
pub fn folder_table(rows: &[FolderSummary]) -> (Table, Option<String>) {
    let mut sorted: Vec<&FolderSummary> = rows.iter().collect();
    sorted.sort_by(|a, b| b.total_size.cmp(&a.total_size));

    let reasons: BTreeSet<&str> = sorted.iter().map(|r| r.reason.as_str()).collect();
    let shared_reason = if reasons.len() == 1 {
        reasons.first().map(|r| r.to_string())
    } else {
        None
    };

    let mut headers = vec![
        "S.No",
        "Folder",
        "File Count",
        "Oldest",
        "Newest",
        "Size (MB)",
        "Oldest File (days diff)",
        "Newest File (days diff)",
    ];
    if shared_reason.is_none() {
        headers.push("Reason");
    }

    let mut table = Table::new(&headers);
    for (i, r) in sorted.iter().enumerate() {
        let mut row = vec![
            (i + 1).to_string(),
            r.folder.clone(),
            r.file_count.to_string(),
            r.oldest.format(DISPLAY_DATE).to_string(),
            r.newest.format(DISPLAY_DATE).to_string(),
            format_mb(r.total_size),
            format!("({}) {}", r.oldest_days, r.oldest_file),
            format!("({}) {}", r.newest_days, r.newest_file),
        ];
        if shared_reason.is_none() {
            row.push(r.reason.clone());
        }
        table.add_row(row);
    }

    (table, shared_reason)
}

pub fn print_folder_report(title: &str, rows: &[FolderSummary]) {
    println!();
    if rows.is_empty() {
        println!("{}: None", title);
        return;
    }
    println!("{}:", title.bold());
    let (table, shared_reason) = folder_table(rows);
    if let Some(reason) = shared_reason {
        println!("**{}**", reason);
        println!();
    }
    table.print();
}

pub fn print_summary(summary: &DeletionSummary) {
    println!();
    println!("{}", "Summary of deletion candidates:".bold());
    println!("  Build folders to be deleted: {}", summary.folders);
    println!("  Total files to be deleted: {}", summary.files);
    println!(
        "  Total space to be freed: {} MB",
        format_mb(summary.total_size).green()
    );
}
