//! # ACME Report Parser
//!
//! ACME's `-r` report prints one line per source line in fixed columns:
//!
//! ```text
//!      3  c000 a200               	ldx #0
//!      4  c002 bd0ec0             loop:	lda text,x
//! ```
//!
//! Columns `0..6` hold the line number, columns `6..32` the address and the
//! emitted bytes (concatenated or space-separated), and the source text
//! starts at column 32.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use log::{info, trace};
use regex::Regex;

use super::{expand_tabs, split_at_column, Listing, ListingBuilder};
use crate::cycles::CycleTable;
use crate::error::ConfigError;

/// Lines at the top of the report that precede the first source line.
pub const HEADER_LINES: usize = 2;

/// Width of the line-number field.
pub const NUMBER_COLUMNS: usize = 6;

/// Column where the source text starts.
pub const SOURCE_COLUMN: usize = 32;

static DUMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9a-fA-F]{4})\s+([0-9a-fA-F]{2})").expect("dump pattern is valid")
});

/// Parses an ACME report.
///
/// Never fails: a line without a numeric line-number field is kept verbatim
/// with no address or label.
///
/// # Examples
///
/// ```
/// use trace6502::{listing::acme, CycleTable};
///
/// let report = [
///     "; ******** Source: demo.a",
///     "",
///     "     1                          *= $0800",
///     "     2  0800 a901               start:  lda #$01",
///     "     3  0802 8500                       sta $00",
/// ]
/// .join("\n");
///
/// let listing = acme::parse(&report, &CycleTable::nmos());
///
/// assert_eq!(listing.default_entry_address(), Some(0x0800));
/// assert_eq!(listing.lines()[1].address, Some(0x0800));
/// assert_eq!(listing.lines()[1].label.as_deref(), Some("start"));
/// assert_eq!(listing.lines()[2].cycle_cost, Some(3));
/// ```
pub fn parse(report: &str, table: &CycleTable) -> Listing {
    let mut builder = ListingBuilder::new(table);

    for raw in report.lines().skip(HEADER_LINES) {
        let line = expand_tabs(raw.trim_end());
        let number = builder.next_index() + 1;

        let (number_field, rest) = split_at_column(&line, NUMBER_COLUMNS);
        let number_field = number_field.trim();
        if number_field.is_empty() || !number_field.bytes().all(|b| b.is_ascii_digit()) {
            trace!("report line {} kept verbatim: {:?}", number, line);
            builder.push_verbatim(line);
            continue;
        }

        let (dump, code) = split_at_column(rest, SOURCE_COLUMN - NUMBER_COLUMNS);

        // Only lines that emitted bytes are addressed
        let (address, opcode) = match DUMP_RE.captures(dump) {
            Some(caps) => (
                u16::from_str_radix(&caps[1], 16).ok(),
                u8::from_str_radix(&caps[2], 16).ok(),
            ),
            None => (None, None),
        };

        // ACME restarts numbering in every included file; renumber globally
        let source_text = format!("{:6}{}", number, rest);

        builder.push_source(source_text, code, address, opcode);
    }

    let entry = builder.pc_assignment();
    let listing = builder.finish(entry);

    info!(
        "ACME report: {} lines, {} addresses, {} watch locations",
        listing.lines().len(),
        listing.address_index().len(),
        listing.watch_locations().len()
    );

    listing
}

/// Reads and parses an ACME report file.
pub fn parse_file(path: &Path, table: &CycleTable) -> Result<Listing, ConfigError> {
    let report = fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
    Ok(parse(&report, table))
}
