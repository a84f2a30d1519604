//! # ca65 Listing and ld65 Map Parser
//!
//! ca65 listings give segment-relative offsets:
//!
//! ```text
//! 000000r 1               .segment "CODE"
//! 000000r 1  A9 01        start:  lda #$01
//! 000002r 1  85 00                sta $00
//! ```
//!
//! The ld65 map file supplies the base address of each segment, so the
//! effective address of a line is `segment base + offset`. The base changes
//! whenever a `.segment` directive names a segment found in the map.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use log::{debug, info, trace, warn};
use regex::Regex;

use super::{expand_tabs, Listing, ListingBuilder, ListingError};
use crate::cycles::CycleTable;
use crate::error::ConfigError;

/// Lines at the top of a ca65 listing that precede the first source line.
pub const HEADER_LINES: usize = 4;

/// Marker that opens the segment table in an ld65 map file.
pub const SEGMENT_LIST_MARKER: &str = "Segment list:";

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-F]+)r\s+([0-9]+)\s(.{0,12})(.*)$").expect("listing pattern is valid")
});

static SEGMENT_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\.segment\s+"([^"]+)""#).expect("segment directive pattern is valid")
});

static SEGMENT_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+([0-9A-F]{6})").expect("segment row pattern is valid")
});

static OPCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9A-F]{2})\b").expect("opcode pattern is valid"));

/// Segment name to base address, read from an ld65 map file.
pub type SegmentMap = HashMap<String, u16>;

/// Reads the `Segment list:` section of an ld65 map file.
///
/// The section ends at the first blank line. Rows whose start address does
/// not fit in 16 bits are skipped.
///
/// # Errors
///
/// `ListingError::MissingSegmentList` if the marker is absent.
pub fn parse_segments(map: &str) -> Result<SegmentMap, ListingError> {
    let mut lines = map
        .lines()
        .skip_while(|line| !line.contains(SEGMENT_LIST_MARKER));

    if lines.next().is_none() {
        return Err(ListingError::MissingSegmentList);
    }

    let mut segments = SegmentMap::new();
    for line in lines.map(str::trim).take_while(|line| !line.is_empty()) {
        let Some(caps) = SEGMENT_ROW_RE.captures(line) else {
            continue;
        };

        match u16::from_str_radix(&caps[2], 16) {
            Ok(base) => {
                debug!("segment {} at ${:04X}", &caps[1], base);
                segments.insert(caps[1].to_string(), base);
            }
            Err(_) => warn!("segment {} at ${} is outside 16-bit space", &caps[1], &caps[2]),
        }
    }

    Ok(segments)
}

/// Parses a ca65 listing against the segment bases of its ld65 map.
///
/// Lines that do not follow the listing layout are kept verbatim. When the
/// source never assigns `*`, the default entry address is the first line
/// that emitted bytes.
///
/// # Errors
///
/// `ListingError::MissingSegmentList` if the map has no segment table.
pub fn parse(listing: &str, map: &str, table: &CycleTable) -> Result<Listing, ListingError> {
    let segments = parse_segments(map)?;
    Ok(parse_with_segments(listing, &segments, table))
}

/// Reads and parses a ca65 listing file and its ld65 map file.
pub fn parse_files(listing: &Path, map: &Path, table: &CycleTable) -> Result<Listing, ConfigError> {
    let listing_text = fs::read_to_string(listing).map_err(|err| ConfigError::io(listing, err))?;
    let map_text = fs::read_to_string(map).map_err(|err| ConfigError::io(map, err))?;
    Ok(parse(&listing_text, &map_text, table)?)
}

/// Parses a ca65 listing with an already-read segment map.
pub fn parse_with_segments(listing: &str, segments: &SegmentMap, table: &CycleTable) -> Listing {
    let mut builder = ListingBuilder::new(table);
    let mut segment_base: u16 = 0;
    let mut first_address: Option<u16> = None;

    for raw in listing.lines().skip(HEADER_LINES) {
        let line = expand_tabs(raw.trim_end());

        let Some(caps) = LINE_RE.captures(&line) else {
            trace!("listing line {} kept verbatim: {:?}", builder.next_index() + 1, line);
            builder.push_verbatim(line);
            continue;
        };

        let bytes = &caps[3];
        let code = &caps[4];

        if let Some(seg) = SEGMENT_DIRECTIVE_RE.captures(code) {
            if let Some(&base) = segments.get(&seg[1]) {
                debug!("switching to segment {} at ${:04X}", &seg[1], base);
                segment_base = base;
            }
        }

        // Offsets are up to 24 bits wide in the listing
        let effective = u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(|offset| offset.checked_add(segment_base as u32))
            .and_then(|address| u16::try_from(address).ok());

        let address = if bytes.trim().is_empty() { None } else { effective };
        let opcode = address
            .and_then(|_| OPCODE_RE.captures(bytes))
            .and_then(|op| u8::from_str_radix(&op[1], 16).ok());

        if first_address.is_none() {
            first_address = address;
        }

        let source_text = match address {
            Some(addr) => format!("{:04X} | {:<12} | {}", addr, bytes, code),
            None => format!("   - | {:<12} | {}", bytes, code),
        };

        builder.push_source(source_text, code, address, opcode);
    }

    let entry = builder.pc_assignment().or(first_address);
    let listing = builder.finish(entry);

    info!(
        "ca65 listing: {} lines, {} addresses, {} watch locations, {} segments",
        listing.lines().len(),
        listing.address_index().len(),
        listing.watch_locations().len(),
        segments.len()
    );

    listing
}
