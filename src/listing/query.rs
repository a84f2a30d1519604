//! # Cycle-Range Query Language
//!
//! A query is a comma-separated list of `A-B` pairs. Each endpoint is either
//! a 1-based line number or a piece of a label:
//!
//! ```text
//! 12-20, loop-done, 40-exit
//! ```
//!
//! A label endpoint resolves to the first line (in file order) whose label
//! contains it. The whole query fails if any pair is malformed, names an
//! unknown line, or runs backwards.

use thiserror::Error;

use super::{CycleRange, LineInfo};

/// Errors produced while parsing or applying a cycle-range query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A comma-separated element is not of the form `A-B`.
    #[error("expected 'first-last', found '{pair}'")]
    Syntax { pair: String },

    /// An endpoint is neither a line number nor part of any label.
    #[error("no line matches '{reference}'")]
    UnresolvedLine { reference: String },

    /// A range whose first line comes after its last line (1-based).
    #[error("range {first}-{last} runs backwards")]
    Reversed { first: usize, last: usize },

    /// A line number past the end of the listing (1-based).
    #[error("line {line} is past the end of the listing ({count} lines)")]
    LineOutOfRange { line: usize, count: usize },
}

/// Resolves one endpoint to a 0-based line index.
///
/// All-digit references are 1-based line numbers and are returned without
/// bounds checking (line `0` yields `None`). Anything else is matched as a
/// substring against line labels, first match wins.
pub fn resolve_line(reference: &str, lines: &[LineInfo]) -> Option<usize> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if reference.bytes().all(|b| b.is_ascii_digit()) {
        return reference.parse::<usize>().ok()?.checked_sub(1);
    }

    lines.iter().position(|line| {
        line.label
            .as_deref()
            .is_some_and(|label| label.contains(reference))
    })
}

/// Parses a whole query into ranges of 0-based line indices.
///
/// # Errors
///
/// Returns the first problem found; no partial result is produced.
///
/// # Examples
///
/// ```
/// use trace6502::listing::{parse_ranges, CycleRange, LineInfo};
///
/// let mut lines: Vec<LineInfo> = (0..6).map(|_| LineInfo::verbatim("")).collect();
/// lines[3].label = Some("loop".to_string());
///
/// let ranges = parse_ranges("1-2, loop-6", &lines).unwrap();
/// assert_eq!(ranges, vec![CycleRange::new(0, 1), CycleRange::new(3, 5)]);
///
/// assert!(parse_ranges("1-2-3", &lines).is_err());
/// assert!(parse_ranges("5-2", &lines).is_err());
/// ```
pub fn parse_ranges(query: &str, lines: &[LineInfo]) -> Result<Vec<CycleRange>, QueryError> {
    query
        .split(',')
        .map(|pair| parse_pair(pair, lines))
        .collect()
}

fn parse_pair(pair: &str, lines: &[LineInfo]) -> Result<CycleRange, QueryError> {
    let syntax = || QueryError::Syntax {
        pair: pair.trim().to_string(),
    };

    let mut ends = pair.split('-');
    let (Some(first), Some(last), None) = (ends.next(), ends.next(), ends.next()) else {
        return Err(syntax());
    };
    if first.trim().is_empty() || last.trim().is_empty() {
        return Err(syntax());
    }

    let first = resolve_endpoint(first, lines)?;
    let last = resolve_endpoint(last, lines)?;

    if first > last {
        return Err(QueryError::Reversed {
            first: first + 1,
            last: last + 1,
        });
    }

    Ok(CycleRange::new(first, last))
}

fn resolve_endpoint(reference: &str, lines: &[LineInfo]) -> Result<usize, QueryError> {
    let index = resolve_line(reference, lines).ok_or_else(|| QueryError::UnresolvedLine {
        reference: reference.trim().to_string(),
    })?;

    if index >= lines.len() {
        return Err(QueryError::LineOutOfRange {
            line: index + 1,
            count: lines.len(),
        });
    }

    Ok(index)
}
