//! Text rendering of parsed coverage records.

use std::io::{self, Write};

use crate::config::{DEFAULT_PATH_WIDTH, DEFAULT_TABLE_LIMIT};
use crate::lcov::CoverageRecord;
use crate::ranges::compress_ranges;

const BANNER_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Case-sensitive substring a path must contain.
    pub filter: Option<String>,
    /// Print uncovered line ranges under each filtered record.
    pub show_uncovered: bool,
    /// Rows printed when no filter is given.
    pub table_limit: usize,
    pub path_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            filter: None,
            show_uncovered: false,
            table_limit: DEFAULT_TABLE_LIMIT,
            path_width: DEFAULT_PATH_WIDTH,
        }
    }
}

/// Records ordered by ascending coverage. Ties keep their input order.
pub fn sort_by_coverage(records: &[CoverageRecord]) -> Vec<&CoverageRecord> {
    let mut sorted: Vec<&CoverageRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.coverage_percent().total_cmp(&b.coverage_percent()));
    sorted
}

pub fn render_report<W: Write>(
    out: &mut W,
    records: &[CoverageRecord],
    options: &RenderOptions,
) -> io::Result<()> {
    let sorted = sort_by_coverage(records);

    match options.filter.as_deref() {
        Some(pattern) => render_filtered(out, &sorted, pattern, options),
        None => render_lowest(out, &sorted, options),
    }
}

fn render_lowest<W: Write>(
    out: &mut W,
    sorted: &[&CoverageRecord],
    options: &RenderOptions,
) -> io::Result<()> {
    writeln!(out, "Files with lowest coverage:")?;
    writeln!(out)?;

    for record in sorted.iter().take(options.table_limit) {
        writeln!(out, "{}", format_record(record, options.path_width))?;
    }

    Ok(())
}

fn render_filtered<W: Write>(
    out: &mut W,
    sorted: &[&CoverageRecord],
    pattern: &str,
    options: &RenderOptions,
) -> io::Result<()> {
    let matching: Vec<&CoverageRecord> = sorted
        .iter()
        .copied()
        .filter(|record| record.path.contains(pattern))
        .collect();

    if matching.is_empty() {
        writeln!(out, "No files found matching '{pattern}'")?;
        return Ok(());
    }

    let rule = "=".repeat(BANNER_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "FILES MATCHING '{pattern}':")?;
    writeln!(out, "{rule}")?;

    for record in matching {
        writeln!(out, "{}", format_record(record, options.path_width))?;
        if options.show_uncovered {
            writeln!(out, "    Uncovered lines: {}", format_uncovered(record))?;
            writeln!(out)?;
        }
    }

    Ok(())
}

/// One table row: path, percentage and hit/found counts.
pub fn format_record(record: &CoverageRecord, path_width: usize) -> String {
    format!(
        "{:<width$} {:>6.1}% ({:>4}/{:>4})",
        record.path,
        record.coverage_percent(),
        record.lines_hit,
        record.lines_found,
        width = path_width,
    )
}

fn format_uncovered(record: &CoverageRecord) -> String {
    match record.uncovered_lines.as_deref() {
        Some(lines) if !lines.is_empty() => compress_ranges(lines),
        _ => "none".to_string(),
    }
}
