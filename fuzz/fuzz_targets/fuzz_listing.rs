//! Fuzz target for the listing parsers and the cycle-range query language.
//!
//! Arbitrary text goes through both dialects, then an arbitrary query is
//! applied to the result. None of it may panic, and a rejected query must
//! leave the marks as they were.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use trace6502::listing::{acme, ca65, parse_ranges};
use trace6502::CycleTable;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    report: String,
    map: String,
    query: String,
}

fuzz_target!(|input: FuzzInput| {
    let table = CycleTable::nmos();

    let _ = ca65::parse(&input.report, &input.map, &table);

    let mut listing = acme::parse(&input.report, &table);
    let before: Vec<_> = listing.lines().iter().map(|l| l.cycle_mark).collect();

    match parse_ranges(&input.query, listing.lines()) {
        Ok(ranges) => {
            // Parsed ranges are always in bounds and ordered
            let total = listing.mark_cycle_ranges(&ranges).unwrap();
            let last = listing.lines().iter().filter_map(|l| l.cycle_mark).last();
            assert_eq!(last, Some(total));
        }
        Err(_) => {
            let after: Vec<_> = listing.lines().iter().map(|l| l.cycle_mark).collect();
            assert_eq!(before, after);
        }
    }
});
