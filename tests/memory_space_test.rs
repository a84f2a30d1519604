//! Integration tests for the segmented address space.
//!
//! These tests exercise `MemorySpace` through its public API and through
//! the `MemoryBus` trait a processor model would use.

use trace6502::{BlockSpec, MemoryBus, MemoryError, MemorySpace};

fn typical_layout() -> MemorySpace {
    MemorySpace::new([
        // Zero page, stack and program RAM
        BlockSpec::ram(0x0000, 0x8000),
        // Cartridge ROM
        BlockSpec::rom(0xA000, 0x2000).with_data(vec![0x4C, 0x00, 0xA0]),
        // Kernal ROM with the vectors
        BlockSpec::rom(0xE000, 0x2000)
            .with_data(vec![0x00, 0xE0])
            .at_offset(0x1FFC),
    ])
    .unwrap()
}

#[test]
fn test_reads_route_to_owning_block() {
    let mem = typical_layout();

    assert_eq!(mem.read(0xA000), Ok(0x4C));
    assert_eq!(mem.read_word(0xA001), Ok(0xA000));
    assert_eq!(mem.read_word(0xFFFC), Ok(0xE000));
    assert_eq!(mem.read(0x7FFF), Ok(0x00));
}

#[test]
fn test_gaps_are_unmapped() {
    let mut mem = typical_layout();

    assert_eq!(mem.read(0x8000), Err(MemoryError::Unmapped { address: 0x8000 }));
    assert_eq!(mem.read(0x9FFF), Err(MemoryError::Unmapped { address: 0x9FFF }));
    assert_eq!(
        mem.write(0xC000, 1),
        Err(MemoryError::Unmapped { address: 0xC000 })
    );
    assert!(!mem.contains(0xC000));
    assert!(!mem.contains(0xDFFF) && mem.contains(0xE000));
}

#[test]
fn test_rom_writes_never_mutate() {
    let mut mem = typical_layout();

    assert_eq!(
        mem.write(0xA000, 0xFF),
        Err(MemoryError::ReadOnly { address: 0xA000 })
    );
    assert_eq!(
        mem.write_word(0xFFFC, 0x1234),
        Err(MemoryError::ReadOnly { address: 0xFFFC })
    );
    assert_eq!(mem.read(0xA000), Ok(0x4C));
    assert_eq!(mem.read_word(0xFFFC), Ok(0xE000));
}

#[test]
fn test_word_write_straddling_into_rom_is_rejected_whole() {
    let mut mem = MemorySpace::new([
        BlockSpec::ram(0x0000, 0x1000),
        BlockSpec::rom(0x1000, 0x1000),
    ])
    .unwrap();

    assert_eq!(
        mem.write_word(0x0FFF, 0xBEEF),
        Err(MemoryError::ReadOnly { address: 0x1000 })
    );
    assert_eq!(mem.read(0x0FFF), Ok(0x00));
}

#[test]
fn test_reset_restores_loaded_contents() {
    let mut mem = MemorySpace::new([
        BlockSpec::ram(0x0000, 0x1000).with_data(vec![1, 2, 3]).at_offset(0x0800),
    ])
    .unwrap();

    mem.write(0x0800, 0xAA).unwrap();
    mem.write(0x0000, 0x55).unwrap();
    mem.reset();

    assert_eq!(mem.read(0x0800), Ok(1));
    assert_eq!(mem.read(0x0802), Ok(3));
    assert_eq!(mem.read(0x0000), Ok(0));
    assert_eq!(mem.blocks().collect::<Vec<_>>(), vec![(0x0000, 0x1000, false)]);
}

#[test]
fn test_overlapping_blocks_rejected_in_either_order() {
    let low_first = MemorySpace::new([
        BlockSpec::ram(0x1000, 0x100),
        BlockSpec::ram(0x10FF, 0x100),
    ]);
    let high_first = MemorySpace::new([
        BlockSpec::ram(0x10FF, 0x100),
        BlockSpec::ram(0x1000, 0x100),
    ]);

    assert!(matches!(low_first, Err(MemoryError::Overlap { .. })));
    assert!(matches!(high_first, Err(MemoryError::Overlap { .. })));

    // Containment is an overlap too
    assert!(matches!(
        MemorySpace::new([BlockSpec::ram(0x0000, 0x1000), BlockSpec::rom(0x0400, 0x10)]),
        Err(MemoryError::Overlap { .. })
    ));
}

#[test]
fn test_masked_write_keeps_low_byte() {
    let mut mem = MemorySpace::flat();

    mem.write_masked(0x0200, 0x1FF).unwrap();
    assert_eq!(mem.read(0x0200), Ok(0xFF));
}

/// A processor model only sees the trait.
fn copy_block<M: MemoryBus>(bus: &mut M, from: u16, to: u16, len: u16) -> Result<(), MemoryError> {
    for i in 0..len {
        let value = bus.read(from + i)?;
        bus.write(to + i, value)?;
    }
    Ok(())
}

#[test]
fn test_generic_bus_access() {
    let mut mem = typical_layout();

    copy_block(&mut mem, 0xA000, 0x0400, 3).unwrap();
    assert_eq!(mem.read(0x0402), Ok(0xA0));

    assert_eq!(
        copy_block(&mut mem, 0x0400, 0xA000, 1),
        Err(MemoryError::ReadOnly { address: 0xA000 })
    );
}
