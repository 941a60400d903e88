//! LCOV trace parsing.
//!
//! A trace is a sequence of per-file blocks terminated by `end_of_record`.
//! Only the `SF`, `LF`, `LH` and `DA` fields are read; every other field is
//! ignored. Blocks that are not project sources or lack usable line counts
//! are dropped without failing the parse.

use std::fs;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::error::{ReportError, ReportResult};

const END_OF_RECORD: &str = "end_of_record";
const BINARY_DIR_MARKER: &str = "/bin/";
const SOURCE_DIR_MARKER: &str = "/src/";

/// Line coverage for one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRecord {
    pub path: String,
    pub lines_found: u64,
    pub lines_hit: u64,
    /// Lines with a zero hit count, in trace order. `None` unless line
    /// detail was requested.
    pub uncovered_lines: Option<Vec<u32>>,
}

impl CoverageRecord {
    pub fn coverage_percent(&self) -> f64 {
        (self.lines_hit as f64 / self.lines_found as f64) * 100.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
enum SkipReason {
    #[error("no SF path")]
    MissingPath,
    #[error("binary output")]
    BinaryOutput,
    #[error("not under a source directory")]
    NotSource,
    #[error("no LF count")]
    MissingLinesFound,
    #[error("no LH count")]
    MissingLinesHit,
    #[error("no instrumented lines")]
    NoInstrumentedLines,
    #[error("LH {hit} exceeds LF {found}")]
    HitExceedsFound { hit: u64, found: u64 },
}

#[derive(Debug, Default)]
struct PendingBlock<'a> {
    has_content: bool,
    path: Option<&'a str>,
    lines_found: Option<u64>,
    lines_hit: Option<u64>,
    uncovered: Vec<u32>,
}

impl<'a> PendingBlock<'a> {
    fn accept(&mut self, line: &'a str, collect_uncovered: bool) {
        if line.is_empty() {
            return;
        }
        self.has_content = true;

        if let Some(path) = line.strip_prefix("SF:") {
            if self.path.is_none() && !path.is_empty() {
                self.path = Some(path);
            }
        } else if let Some(count) = line.strip_prefix("LF:") {
            if self.lines_found.is_none() {
                self.lines_found = parse_count(count);
            }
        } else if let Some(count) = line.strip_prefix("LH:") {
            if self.lines_hit.is_none() {
                self.lines_hit = parse_count(count);
            }
        } else if let Some(entry) = line.strip_prefix("DA:") {
            if collect_uncovered {
                if let Some(line_number) = parse_uncovered_line(entry) {
                    self.uncovered.push(line_number);
                }
            }
        }
    }

    fn finish(
        self,
        project_marker: &str,
        collect_uncovered: bool,
    ) -> Result<CoverageRecord, SkipReason> {
        let path = self.path.ok_or(SkipReason::MissingPath)?;

        if path.contains(BINARY_DIR_MARKER) {
            return Err(SkipReason::BinaryOutput);
        }
        if !path.contains(SOURCE_DIR_MARKER) {
            return Err(SkipReason::NotSource);
        }

        let found = self.lines_found.ok_or(SkipReason::MissingLinesFound)?;
        let hit = self.lines_hit.ok_or(SkipReason::MissingLinesHit)?;
        if found == 0 {
            return Err(SkipReason::NoInstrumentedLines);
        }
        if hit > found {
            return Err(SkipReason::HitExceedsFound { hit, found });
        }

        Ok(CoverageRecord {
            path: relative_path(path, project_marker).to_string(),
            lines_found: found,
            lines_hit: hit,
            uncovered_lines: collect_uncovered.then_some(self.uncovered),
        })
    }
}

/// Parse trace text into records, in order of appearance.
///
/// `project_root` is the directory name paths are made relative to. When
/// `collect_uncovered` is set, each record carries its zero-hit `DA` lines.
pub fn parse_report(
    content: &str,
    project_root: &str,
    collect_uncovered: bool,
) -> Vec<CoverageRecord> {
    let project_marker = format!("/{project_root}/");
    let mut records = Vec::new();
    let mut block = PendingBlock::default();

    for raw_line in content.lines() {
        let line = raw_line.trim_end();
        if line.trim_start() == END_OF_RECORD {
            let finished = std::mem::take(&mut block);
            push_block(finished, &project_marker, collect_uncovered, &mut records);
        } else {
            block.accept(line, collect_uncovered);
        }
    }

    // Trailing text without a terminator still counts as a block.
    push_block(block, &project_marker, collect_uncovered, &mut records);

    records
}

/// Read and parse the report named by `config`.
pub fn read_report(
    config: &ReportConfig,
    collect_uncovered: bool,
) -> ReportResult<Vec<CoverageRecord>> {
    debug!(path = %config.report_path.display(), "reading coverage report");
    let content = fs::read_to_string(&config.report_path)
        .map_err(|err| ReportError::io(&config.report_path, err))?;

    let records = parse_report(&content, &config.project_root, collect_uncovered);
    info!(records = records.len(), "parsed coverage report");
    Ok(records)
}

fn push_block(
    block: PendingBlock<'_>,
    project_marker: &str,
    collect_uncovered: bool,
    records: &mut Vec<CoverageRecord>,
) {
    if !block.has_content {
        return;
    }

    let path = block.path.unwrap_or_default().to_string();
    match block.finish(project_marker, collect_uncovered) {
        Ok(record) => records.push(record),
        Err(reason) => debug!(%path, %reason, "skipping coverage record"),
    }
}

fn relative_path<'a>(path: &'a str, project_marker: &str) -> &'a str {
    path.split_once(project_marker).map_or(path, |(_, relative)| relative)
}

fn parse_count(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

// DA:<line>,<hits>[,<checksum>]
fn parse_uncovered_line(entry: &str) -> Option<u32> {
    let mut parts = entry.split(',');
    let line_number = parts.next()?.trim().parse::<u32>().ok()?;
    let hits = parts.next()?.trim().parse::<i64>().ok()?;

    (line_number > 0 && hits == 0).then_some(line_number)
}
