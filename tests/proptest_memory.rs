//! Property-based tests for address-space invariants.
//!
//! These tests use proptest to check that `MemorySpace` keeps its
//! guarantees for arbitrary layouts and accesses.

use proptest::prelude::*;
use trace6502::{BlockSpec, MemoryError, MemorySpace};

/// A block that fits in the address space.
fn block_strategy() -> impl Strategy<Value = (u16, usize, bool)> {
    (any::<u16>(), 1usize..0x800, any::<bool>()).prop_map(|(start, length, readonly)| {
        let length = length.min(0x10000 - start as usize);
        (start, length, readonly)
    })
}

fn spec((start, length, readonly): (u16, usize, bool)) -> BlockSpec {
    if readonly {
        BlockSpec::rom(start, length)
    } else {
        BlockSpec::ram(start, length)
    }
}

fn overlaps(a: (u16, usize, bool), b: (u16, usize, bool)) -> bool {
    let (a_start, a_end) = (a.0 as usize, a.0 as usize + a.1);
    let (b_start, b_end) = (b.0 as usize, b.0 as usize + b.1);
    a_start < b_end && b_start < a_end
}

proptest! {
    #[test]
    fn prop_two_blocks_accepted_iff_disjoint(a in block_strategy(), b in block_strategy()) {
        let result = MemorySpace::new([spec(a), spec(b)]);

        if overlaps(a, b) {
            let is_overlap = matches!(result, Err(MemoryError::Overlap { .. }));
            prop_assert!(is_overlap);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn prop_ram_write_read_round_trip(addr in any::<u16>(), value in any::<u8>()) {
        let mut mem = MemorySpace::flat();

        mem.write(addr, value).unwrap();
        prop_assert_eq!(mem.read(addr), Ok(value));
    }

    #[test]
    fn prop_masked_write_keeps_low_eight_bits(addr in any::<u16>(), value in any::<u16>()) {
        let mut mem = MemorySpace::flat();

        mem.write_masked(addr, value).unwrap();
        prop_assert_eq!(mem.read(addr), Ok((value & 0xFF) as u8));
    }

    #[test]
    fn prop_rom_writes_never_mutate(
        data in prop::collection::vec(any::<u8>(), 1..64),
        index in any::<usize>(),
        value in any::<u8>(),
    ) {
        let mut mem = MemorySpace::new([BlockSpec::rom(0x8000, data.len()).with_data(data.clone())]).unwrap();
        let addr = 0x8000 + (index % data.len()) as u16;

        prop_assert_eq!(mem.write(addr, value), Err(MemoryError::ReadOnly { address: addr }));
        prop_assert_eq!(mem.read(addr), Ok(data[index % data.len()]));
    }

    #[test]
    fn prop_word_round_trip(addr in any::<u16>(), word in any::<u16>()) {
        let mut mem = MemorySpace::flat();

        mem.write_word(addr, word).unwrap();
        prop_assert_eq!(mem.read_word(addr), Ok(word));
        prop_assert_eq!(mem.read(addr), Ok((word & 0xFF) as u8));
        prop_assert_eq!(mem.read(addr.wrapping_add(1)), Ok((word >> 8) as u8));
    }

    #[test]
    fn prop_reset_restores_construction_contents(
        data in prop::collection::vec(any::<u8>(), 1..256),
        writes in prop::collection::vec((any::<u8>(), any::<u8>()), 0..32),
    ) {
        let mut mem = MemorySpace::new([BlockSpec::ram(0x0200, 0x100).with_data(data.clone())]).unwrap();

        for (offset, value) in writes {
            mem.write(0x0200 + offset as u16, value).unwrap();
        }
        mem.reset();

        for (i, expected) in data.iter().enumerate() {
            prop_assert_eq!(mem.read(0x0200 + i as u16), Ok(*expected));
        }
    }

    #[test]
    fn prop_unmapped_access_fails(addr in 0x1000u16..=0xFFFF, value in any::<u8>()) {
        let mut mem = MemorySpace::new([BlockSpec::ram(0x0000, 0x1000)]).unwrap();

        prop_assert_eq!(mem.read(addr), Err(MemoryError::Unmapped { address: addr }));
        prop_assert_eq!(mem.write(addr, value), Err(MemoryError::Unmapped { address: addr }));
    }
}
