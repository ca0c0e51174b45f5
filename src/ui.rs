//! Terminal UI utilities.
//!
//! Report tables use heavy box-drawing characters. When stdout is a terminal
//! the widest columns are shrunk until the table fits; piped output is never
//! truncated so logs keep full artifact paths.
//!
//! ```rust
//! use rtsweep::ui::Table;
//!
//! let mut table = Table::new(&["Folder", "Size (MB)"]);
//! table.add_row(vec!["libs/app/build_x_1_2345".to_string(), "12.50".to_string()]);
//! assert!(table.render(None).contains("build_x_1_2345"));
//! ```

use colored::*;
use std::cmp;

const MIN_COLUMN_WIDTH: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        let term = console::Term::stdout();
        let max_width = if term.is_term() {
            Some(term.size().1 as usize)
        } else {
            None
        };
        print!("{}", self.render(max_width));
    }

    /// Renders the table, fitting it into `max_width` columns when given.
    pub fn render(&self, max_width: Option<usize>) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut col_widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let visible = console::measure_text_width(&sanitize_content(cell));
                col_widths[i] = cmp::max(col_widths[i], visible);
            }
        }

        if let Some(max_width) = max_width {
            shrink_to_fit(&mut col_widths, max_width);
        }

        let sep = |left: &str, mid: &str, right: &str| -> String {
            let inner: Vec<String> = col_widths.iter().map(|w| "━".repeat(w + 2)).collect();
            format!("{}{}{}\n", left, inner.join(mid), right)
        };

        let line = |cells: Vec<String>| -> String {
            let mut s = String::from("┃");
            for (cell, width) in cells.iter().zip(&col_widths) {
                let fitted = console::truncate_str(cell, *width, "...");
                let padding = width.saturating_sub(console::measure_text_width(&fitted));
                s.push_str(&format!(" {}{} ┃", fitted, " ".repeat(padding)));
            }
            s.push('\n');
            s
        };

        let mut out = String::new();
        out.push_str(&sep("┏", "┳", "┓"));
        out.push_str(&line(
            self.headers.iter().map(|h| h.bold().to_string()).collect(),
        ));
        out.push_str(&sep("┣", "╋", "┫"));
        for row in &self.rows {
            out.push_str(&line(row.iter().map(|c| sanitize_content(c)).collect()));
        }
        out.push_str(&sep("┗", "┻", "┛"));
        out
    }
}

fn shrink_to_fit(col_widths: &mut [usize], max_width: usize) {
    let overhead = 1 + 3 * col_widths.len();
    let available = max_width.saturating_sub(overhead);
    let mut current: usize = col_widths.iter().sum();

    while current > available {
        let Some((idx, &widest)) = col_widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if widest <= MIN_COLUMN_WIDTH {
            break;
        }
        col_widths[idx] -= 1;
        current -= 1;
    }
}

fn sanitize_content(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

/// Bytes to MiB, rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

pub fn format_mb(bytes: u64) -> String {
    format!("{:.2}", bytes_to_mb(bytes))
}
