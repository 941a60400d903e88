//! Compact line range notation, e.g. `1-3, 5, 7-9, 12`.

use crate::error::{ReportError, ReportResult};

const SEPARATOR: &str = ", ";

/// Upper bound on the number of lines `expand_ranges` will produce.
pub const MAX_EXPANDED_LINES: usize = 1_000_000;

/// Render line numbers as ascending ranges of consecutive lines.
///
/// Input order and duplicates do not matter. A single-line run is written
/// as the bare number.
pub fn compress_ranges(lines: &[u32]) -> String {
    let mut sorted = lines.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut tokens = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };

    let (mut start, mut end) = (first, first);
    for line in iter {
        if end.checked_add(1) == Some(line) {
            end = line;
        } else {
            tokens.push(format_run(start, end));
            start = line;
            end = line;
        }
    }
    tokens.push(format_run(start, end));

    tokens.join(SEPARATOR)
}

/// Expand range notation back into ascending line numbers.
///
/// Fails once the expansion would exceed [`MAX_EXPANDED_LINES`].
pub fn expand_ranges(ranges: &str) -> ReportResult<Vec<u32>> {
    let mut lines = Vec::new();
    if ranges.trim().is_empty() {
        return Ok(lines);
    }

    for token in ranges.split(',').map(str::trim) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_line(start, token)?;
                let end = parse_line(end, token)?;
                if end < start {
                    return Err(ReportError::invalid_range(format!(
                        "'{token}' runs backwards"
                    )));
                }
                let run = (end - start) as usize + 1;
                ensure_capacity(lines.len(), run, token)?;
                lines.extend(start..=end);
            }
            None => {
                ensure_capacity(lines.len(), 1, token)?;
                lines.push(parse_line(token, token)?);
            }
        }
    }

    Ok(lines)
}

fn format_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

fn ensure_capacity(current: usize, additional: usize, token: &str) -> ReportResult<()> {
    if current.saturating_add(additional) > MAX_EXPANDED_LINES {
        return Err(ReportError::invalid_range(format!(
            "'{token}' expands past {MAX_EXPANDED_LINES} lines"
        )));
    }
    Ok(())
}

fn parse_line(value: &str, token: &str) -> ReportResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| ReportError::invalid_range(format!("'{token}' is not a line number or range")))
}
