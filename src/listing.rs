//! # Assembler Listing Index
//!
//! Turns assembler output into a line table that can be correlated with the
//! program counter. Two dialects are understood:
//!
//! - [`acme`]: the single-file report written by ACME's `-r` option
//! - [`ca65`]: a ca65 `--listing` file paired with the ld65 `--mapfile`
//!
//! Both parsers are pure functions producing the same [`Listing`].

pub mod acme;
pub mod ca65;
pub mod query;

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use thiserror::Error;

use crate::cycles::CycleTable;
use crate::number::parse_number;

pub use query::{parse_ranges, resolve_line, QueryError};

/// How many bytes below the program counter a lookup may fall back.
pub const LOOKUP_WINDOW: u16 = 4;

/// Errors that prevent a listing from being indexed at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// The ld65 map file has no `Segment list:` section.
    #[error("map file has no 'Segment list:' section")]
    MissingSegmentList,
}

/// One physical line of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    /// Address of the first byte emitted by this line, if it emitted any
    pub address: Option<u16>,

    /// Base cycle cost of the instruction on this line
    pub cycle_cost: Option<u32>,

    /// Label defined on this line
    pub label: Option<String>,

    /// Text shown to the user
    pub source_text: String,

    /// Running cycle total written by the last cycle-range query
    pub cycle_mark: Option<u64>,
}

impl LineInfo {
    /// A line with no address, label or cost.
    pub fn verbatim(source_text: impl Into<String>) -> Self {
        Self {
            address: None,
            cycle_cost: None,
            label: None,
            source_text: source_text.into(),
            cycle_mark: None,
        }
    }
}

/// Size of a watched memory cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    /// Number of bytes covered.
    pub fn bytes(self) -> u16 {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
        }
    }
}

/// A memory cell worth showing live while stepping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchLocation {
    pub label: Option<String>,
    pub address: u16,
    pub width: Width,
}

/// Closed interval of line indices (0-based) used for cycle accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleRange {
    pub first: usize,
    pub last: usize,
}

impl CycleRange {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }
}

/// Address to line lookup.
///
/// Entries are collected in line order and sorted once by [`finalize`],
/// keeping the first line for any address that appears twice.
///
/// [`finalize`]: AddressIndex::finalize
#[derive(Debug, Clone, Default)]
pub struct AddressIndex {
    entries: Vec<(u16, usize)>,
}

impl AddressIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `line` begins at `address`.
    pub fn insert(&mut self, address: u16, line: usize) {
        self.entries.push((address, line));
    }

    /// Sort for binary search, dropping later duplicates.
    pub fn finalize(&mut self) {
        // Stable sort keeps insertion (line) order among equal addresses
        self.entries.sort_by_key(|(addr, _)| *addr);

        self.entries.dedup_by(|later, first| {
            let duplicate = later.0 == first.0;
            if duplicate {
                warn!(
                    "address ${:04X} appears on lines {} and {}; keeping line {}",
                    first.0,
                    first.1 + 1,
                    later.1 + 1,
                    first.1 + 1
                );
            }
            duplicate
        });
    }

    /// Exact lookup.
    pub fn get(&self, address: u16) -> Option<usize> {
        self.entries
            .binary_search_by_key(&address, |(addr, _)| *addr)
            .ok()
            .map(|idx| self.entries[idx].1)
    }

    /// Exact lookup, then the nearest of the `LOOKUP_WINDOW` preceding addresses.
    ///
    /// A program counter inside a multi-byte instruction resolves to the line
    /// the instruction was printed on.
    pub fn locate(&self, pc: u16) -> Option<usize> {
        (0..=LOOKUP_WINDOW).find_map(|back| self.get(pc.wrapping_sub(back)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed listing: line table, address index and watch list.
#[derive(Debug, Clone)]
pub struct Listing {
    lines: Vec<LineInfo>,
    address_index: AddressIndex,
    watch_locations: Vec<WatchLocation>,
    default_entry_address: Option<u16>,
}

impl Listing {
    /// All lines in file order.
    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    pub fn address_index(&self) -> &AddressIndex {
        &self.address_index
    }

    pub fn watch_locations(&self) -> &[WatchLocation] {
        &self.watch_locations
    }

    /// Entry point declared by the listing, if any.
    pub fn default_entry_address(&self) -> Option<u16> {
        self.default_entry_address
    }

    /// Line for a program counter, see [`AddressIndex::locate`].
    pub fn locate(&self, pc: u16) -> Option<usize> {
        self.address_index.locate(pc)
    }

    /// Clears every line's cycle mark.
    pub fn clear_cycle_marks(&mut self) {
        for line in &mut self.lines {
            line.cycle_mark = None;
        }
    }

    /// Accumulates cycle costs over the union of `ranges`.
    ///
    /// All marks are cleared, then the selected lines are visited in
    /// ascending order; each visited line receives the running total of
    /// `cycle_cost` (absent costs count as zero) up to and including itself.
    /// Returns the grand total.
    ///
    /// # Errors
    ///
    /// Fails without touching any mark if a range is reversed or ends past
    /// the last line.
    pub fn mark_cycle_ranges(&mut self, ranges: &[CycleRange]) -> Result<u64, QueryError> {
        let mut selected = vec![false; self.lines.len()];

        for range in ranges {
            if range.first > range.last {
                return Err(QueryError::Reversed {
                    first: range.first + 1,
                    last: range.last + 1,
                });
            }
            if range.last >= self.lines.len() {
                return Err(QueryError::LineOutOfRange {
                    line: range.last + 1,
                    count: self.lines.len(),
                });
            }
            selected[range.first..=range.last].fill(true);
        }

        self.clear_cycle_marks();

        let mut total = 0u64;
        for (line, _) in self
            .lines
            .iter_mut()
            .zip(selected)
            .filter(|(_, selected)| *selected)
        {
            total += line.cycle_cost.unwrap_or(0) as u64;
            line.cycle_mark = Some(total);
        }

        Ok(total)
    }
}

/// Accumulates lines and index entries while a dialect parser runs.
pub(crate) struct ListingBuilder<'t> {
    lines: Vec<LineInfo>,
    address_index: AddressIndex,
    extractor: Extractor<'t>,
}

impl<'t> ListingBuilder<'t> {
    pub(crate) fn new(table: &'t CycleTable) -> Self {
        Self {
            lines: Vec::new(),
            address_index: AddressIndex::new(),
            extractor: Extractor::new(table),
        }
    }

    /// Index the next line will receive.
    pub(crate) fn next_index(&self) -> usize {
        self.lines.len()
    }

    /// Runs the shared extraction rules over `code` and records the line.
    pub(crate) fn push_source(
        &mut self,
        source_text: String,
        code: &str,
        address: Option<u16>,
        opcode: Option<u8>,
    ) {
        let extracted = self.extractor.scan(code, address, opcode);

        if let Some(address) = address {
            self.address_index.insert(address, self.lines.len());
        }

        self.lines.push(LineInfo {
            address,
            cycle_cost: extracted.cycle_cost,
            label: extracted.label,
            source_text,
            cycle_mark: None,
        });
    }

    /// Records a line that matched no known layout.
    pub(crate) fn push_verbatim(&mut self, text: String) {
        self.lines.push(LineInfo::verbatim(text));
    }

    /// Entry address set by a `* = value` assignment, if one was seen.
    pub(crate) fn pc_assignment(&self) -> Option<u16> {
        self.extractor.entry
    }

    pub(crate) fn finish(mut self, default_entry_address: Option<u16>) -> Listing {
        self.address_index.finalize();

        Listing {
            lines: self.lines,
            address_index: self.address_index,
            watch_locations: self.extractor.locations,
            default_entry_address,
        }
    }
}

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^\s:;=]+):").expect("label pattern is valid")
});

static DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)[!.](word|byte)\b").expect("data directive pattern is valid")
});

static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^\s=;:]+)\s*:?=\s*(\$[0-9A-Fa-f]+|0[xX][0-9A-Fa-f]+|%[01]+|[0-9]+)(?:\s|$)")
        .expect("assignment pattern is valid")
});

/// Symbol naming the program counter in an assignment.
const PC_SYMBOL: &str = "*";

#[derive(Debug, Default)]
struct Extracted {
    label: Option<String>,
    cycle_cost: Option<u32>,
}

/// Per-parse state for the rules both dialects share.
struct Extractor<'t> {
    table: &'t CycleTable,
    last_label: Option<String>,
    last_data_label: Option<String>,
    entry: Option<u16>,
    locations: Vec<WatchLocation>,
}

impl<'t> Extractor<'t> {
    fn new(table: &'t CycleTable) -> Self {
        Self {
            table,
            last_label: None,
            last_data_label: None,
            entry: None,
            locations: Vec::new(),
        }
    }

    fn scan(&mut self, code: &str, address: Option<u16>, opcode: Option<u8>) -> Extracted {
        let code = strip_comment(code);
        let mut extracted = Extracted::default();

        if let Some(caps) = LABEL_RE.captures(code) {
            let label = caps[1].to_string();
            self.last_label = Some(label.clone());
            extracted.label = Some(label);
        }

        let data_width = DATA_RE.captures(code).map(|caps| match &caps[1] {
            "word" => Width::Word,
            _ => Width::Byte,
        });

        // One watch per labelled table, not one per row. An address-less
        // row still claims the label so later rows stay silent.
        if let Some(width) = data_width {
            if self.last_data_label != self.last_label {
                self.last_data_label = self.last_label.clone();
                if let Some(address) = address {
                    self.locations.push(WatchLocation {
                        label: self.last_label.clone(),
                        address,
                        width,
                    });
                }
            }
        }

        if let Some(caps) = ASSIGN_RE.captures(code) {
            self.assignment(&caps[1], &caps[2]);
        }

        if address.is_some() {
            extracted.cycle_cost = opcode.map(|op| self.table.cycles(op));
        }

        extracted
    }

    fn assignment(&mut self, symbol: &str, value: &str) {
        let Ok(value) = parse_number(value) else {
            return;
        };

        if symbol == PC_SYMBOL {
            if self.entry.is_none() {
                if let Ok(entry) = u16::try_from(value) {
                    debug!("entry address ${:04X} from program counter assignment", entry);
                    self.entry = Some(entry);
                }
            }
        } else if value < 0x100 {
            // Byte-sized constants are most likely zero-page variables
            self.locations.push(WatchLocation {
                label: Some(symbol.to_string()),
                address: value as u16,
                width: Width::Byte,
            });
        }
    }
}

/// Drops a trailing `;` comment.
fn strip_comment(code: &str) -> &str {
    code.split(';').next().unwrap_or(code)
}

/// Replaces every tab with eight spaces.
pub(crate) fn expand_tabs(line: &str) -> String {
    line.replace('\t', "        ")
}

/// Splits `line` at character column `column`, clamping to the line length.
pub(crate) fn split_at_column(line: &str, column: usize) -> (&str, &str) {
    match line.char_indices().nth(column) {
        Some((byte_index, _)) => line.split_at(byte_index),
        None => (line, ""),
    }
}
