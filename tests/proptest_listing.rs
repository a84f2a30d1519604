//! Property-based tests for listing parsing and cycle marking.

use proptest::prelude::*;
use trace6502::listing::{acme, ca65, parse_ranges};
use trace6502::{CycleRange, CycleTable, Width};

/// An ACME report with one instruction row per opcode.
fn report_for(opcodes: &[u8]) -> String {
    let mut text = String::from("; header\n\n");
    for (i, opcode) in opcodes.iter().enumerate() {
        let dump = format!("{:04x} {:02x}", 0x0800 + i, opcode);
        text.push_str(&format!("{:6}  {:<24}        op\n", i + 1, dump));
    }
    text
}

proptest! {
    #[test]
    fn prop_acme_parser_never_panics(text in "\\PC*") {
        let listing = acme::parse(&text, &CycleTable::nmos());
        prop_assert!(listing.lines().len() <= text.lines().count());
    }

    #[test]
    fn prop_ca65_parser_never_panics(listing in "\\PC*", map in "\\PC*") {
        let _ = ca65::parse(&listing, &map, &CycleTable::nmos());
    }

    #[test]
    fn prop_query_parser_never_panics(query in "[0-9a-z, -]{0,24}") {
        let listing = acme::parse(&report_for(&[0xEA; 8]), &CycleTable::nmos());
        let _ = parse_ranges(&query, listing.lines());
    }

    #[test]
    fn prop_marks_non_decreasing_and_sum_to_total(
        opcodes in prop::collection::vec(any::<u8>(), 1..40),
        bounds in prop::collection::vec((any::<usize>(), any::<usize>()), 1..4),
    ) {
        let table = CycleTable::nmos();
        let mut listing = acme::parse(&report_for(&opcodes), &table);
        let count = listing.lines().len();

        let ranges: Vec<_> = bounds
            .iter()
            .map(|(a, b)| {
                let (a, b) = (a % count, b % count);
                CycleRange::new(a.min(b), a.max(b))
            })
            .collect();

        let total = listing.mark_cycle_ranges(&ranges).unwrap();

        let marks: Vec<u64> = listing.lines().iter().filter_map(|l| l.cycle_mark).collect();
        prop_assert!(marks.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(marks.last().copied(), Some(total));

        let expected: u64 = (0..count)
            .filter(|i| ranges.iter().any(|r| r.first <= *i && *i <= r.last))
            .map(|i| table.cycles(opcodes[i]) as u64)
            .sum();
        prop_assert_eq!(total, expected);
    }

    #[test]
    fn prop_one_word_watch_per_label(rows in 1usize..20) {
        let mut text = String::from("; header\n\n");
        for i in 0..rows {
            let label = if i == 0 { "table:" } else { "" };
            let dump = format!("{:04x} 00 00", 0x0900 + 2 * i);
            text.push_str(&format!("{:6}  {:<24}{:<8}!word 0\n", i + 1, dump, label));
        }

        let listing = acme::parse(&text, &CycleTable::nmos());
        let words: Vec<_> = listing
            .watch_locations()
            .iter()
            .filter(|w| w.width == Width::Word)
            .collect();

        prop_assert_eq!(words.len(), 1);
        prop_assert_eq!(words[0].address, 0x0900);
    }
}
