//! # Segmented Address Space
//!
//! This module provides `MemorySpace`, the store that stands in for 6502 RAM
//! and ROM while a program is being traced, and the `MemoryBus` trait through
//! which a processor model reaches it.
//!
//! ## Design Principles
//!
//! Unlike real 6502 hardware, the traced address space reports faults:
//! - Reads and writes outside every block fail with `MemoryError::Unmapped`
//! - Writes into a read-only block fail with `MemoryError::ReadOnly`
//! - Blocks are fixed at construction and never overlap
//!
//! A failed access never changes memory contents, so the caller can surface
//! the fault and keep tracing from the last good state.

use thiserror::Error;

/// Errors raised by the address space.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// No block covers the address.
    #[error("address ${address:04X} is not mapped")]
    Unmapped {
        /// Offending address
        address: u16,
    },

    /// The block covering the address is read-only.
    #[error("address ${address:04X} is read-only")]
    ReadOnly {
        /// Offending address
        address: u16,
    },

    /// Two requested blocks share at least one address.
    ///
    /// Ranges are reported as inclusive `start-end` pairs.
    #[error(
        "block ${new_start:04X}-${new_end:04X} overlaps block ${existing_start:04X}-${existing_end:04X}"
    )]
    Overlap {
        new_start: u16,
        new_end: u16,
        existing_start: u16,
        existing_end: u16,
    },

    /// A block is empty or runs past the top of the 16-bit address space.
    #[error("block at ${start:04X} with length {length} does not fit in the address space")]
    InvalidBlock { start: u16, length: usize },

    /// Initial data does not fit inside its block.
    #[error(
        "{data_len} bytes at offset {offset} do not fit in the {length}-byte block at ${start:04X}"
    )]
    InitialDataTooLarge {
        start: u16,
        length: usize,
        offset: usize,
        data_len: usize,
    },
}

/// Fallible byte-level access to an address space.
///
/// Processor models are written against this trait rather than a concrete
/// store, the same way a CPU core is generic over its memory bus.
///
/// # Examples
///
/// ```
/// use trace6502::{BlockSpec, MemoryBus, MemorySpace};
///
/// let mut mem = MemorySpace::new([BlockSpec::ram(0x0000, 0x1000)]).unwrap();
///
/// mem.write_word(0x0200, 0xBEEF).unwrap();
/// assert_eq!(mem.read(0x0200).unwrap(), 0xEF);
/// assert_eq!(mem.read_word(0x0200).unwrap(), 0xBEEF);
/// ```
pub trait MemoryBus {
    /// Reads a byte from the specified 16-bit address.
    fn read(&self, addr: u16) -> Result<u8, MemoryError>;

    /// Writes a byte to the specified 16-bit address.
    fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError>;

    /// Reads a little-endian word. The high byte address wraps at `$FFFF`.
    fn read_word(&self, addr: u16) -> Result<u16, MemoryError> {
        let low = self.read(addr)? as u16;
        let high = self.read(addr.wrapping_add(1))? as u16;
        Ok((high << 8) | low)
    }

    /// Writes a little-endian word, low byte first.
    fn write_word(&mut self, addr: u16, value: u16) -> Result<(), MemoryError> {
        self.write(addr, (value & 0xFF) as u8)?;
        self.write(addr.wrapping_add(1), (value >> 8) as u8)
    }
}

/// Description of one block requested at construction time.
///
/// # Examples
///
/// ```
/// use trace6502::BlockSpec;
///
/// // 8KB of RAM at $0000
/// let ram = BlockSpec::ram(0x0000, 0x2000);
///
/// // 4KB ROM at $F000 holding a program image
/// let rom = BlockSpec::rom(0xF000, 0x1000).with_data(vec![0xEA; 16]);
/// assert!(rom.readonly);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpec {
    /// First address covered by the block
    pub start: u16,

    /// Number of bytes covered
    pub length: usize,

    /// Whether writes are rejected
    pub readonly: bool,

    /// Initial contents, copied at `offset`
    pub data: Vec<u8>,

    /// Position inside the block where `data` starts
    pub offset: usize,
}

impl BlockSpec {
    /// A writable, zero-filled block.
    pub fn ram(start: u16, length: usize) -> Self {
        Self {
            start,
            length,
            readonly: false,
            data: Vec::new(),
            offset: 0,
        }
    }

    /// A read-only, zero-filled block.
    pub fn rom(start: u16, length: usize) -> Self {
        Self {
            readonly: true,
            ..Self::ram(start, length)
        }
    }

    /// Sets the initial contents, copied from the start of the block.
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Moves the initial contents to `offset` bytes into the block.
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// One past the last covered address, if the block fits in 64KB.
    fn end(&self) -> Option<u32> {
        u32::try_from(self.length)
            .ok()
            .and_then(|length| (self.start as u32).checked_add(length))
            .filter(|&end| end <= 0x10000)
    }
}

/// A contiguous region with uniform permissions.
#[derive(Debug, Clone)]
struct MemoryBlock {
    start: u16,
    /// One past the last address, as a 17-bit value
    end: u32,
    readonly: bool,
    bytes: Vec<u8>,
    snapshot: Box<[u8]>,
}

impl MemoryBlock {
    fn contains(&self, addr: u16) -> bool {
        addr >= self.start && (addr as u32) < self.end
    }
}

/// Segmented, protection-aware 6502 address space.
///
/// `MemorySpace` is made of non-overlapping blocks, each either writable or
/// read-only. Every block keeps a frozen copy of its construction-time
/// contents so `reset()` can bring the program back to its loaded state.
///
/// # Examples
///
/// ```
/// use trace6502::{BlockSpec, MemoryError, MemorySpace};
///
/// let mut mem = MemorySpace::new([
///     BlockSpec::ram(0x0000, 0x8000),
///     BlockSpec::rom(0xC000, 0x4000).with_data(vec![0xA9, 0x01]),
/// ])
/// .unwrap();
///
/// mem.write(0x1234, 0x42).unwrap();
/// assert_eq!(mem.read(0x1234).unwrap(), 0x42);
///
/// // ROM rejects writes, unmapped space rejects everything
/// assert_eq!(mem.write(0xC000, 0), Err(MemoryError::ReadOnly { address: 0xC000 }));
/// assert_eq!(mem.read(0x9000), Err(MemoryError::Unmapped { address: 0x9000 }));
///
/// mem.reset();
/// assert_eq!(mem.read(0x1234).unwrap(), 0x00);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySpace {
    blocks: Vec<MemoryBlock>,
}

impl MemorySpace {
    /// Builds an address space from block descriptions.
    ///
    /// # Errors
    ///
    /// - `MemoryError::InvalidBlock` if a block is empty or passes `$FFFF`
    /// - `MemoryError::InitialDataTooLarge` if `offset + data.len()` exceeds the block
    /// - `MemoryError::Overlap` if two blocks share an address
    pub fn new(blocks: impl IntoIterator<Item = BlockSpec>) -> Result<Self, MemoryError> {
        let mut space = Self { blocks: Vec::new() };

        for spec in blocks {
            space.add_block(spec)?;
        }

        Ok(space)
    }

    /// A single writable block covering all 64KB.
    pub fn flat() -> Self {
        Self {
            blocks: vec![MemoryBlock {
                start: 0,
                end: 0x10000,
                readonly: false,
                bytes: vec![0; 0x10000],
                snapshot: vec![0; 0x10000].into_boxed_slice(),
            }],
        }
    }

    fn add_block(&mut self, spec: BlockSpec) -> Result<(), MemoryError> {
        let new_end = match spec.end() {
            Some(end) if spec.length > 0 => end,
            _ => {
                return Err(MemoryError::InvalidBlock {
                    start: spec.start,
                    length: spec.length,
                })
            }
        };

        // Half-open ranges [start, end) intersect if each starts before the other ends
        for block in &self.blocks {
            if (spec.start as u32) < block.end && new_end > block.start as u32 {
                return Err(MemoryError::Overlap {
                    new_start: spec.start,
                    new_end: (new_end - 1) as u16,
                    existing_start: block.start,
                    existing_end: (block.end - 1) as u16,
                });
            }
        }

        let data_end = spec.offset.checked_add(spec.data.len());
        let Some(data_end) = data_end.filter(|&end| end <= spec.length) else {
            return Err(MemoryError::InitialDataTooLarge {
                start: spec.start,
                length: spec.length,
                offset: spec.offset,
                data_len: spec.data.len(),
            });
        };

        let mut bytes = vec![0; spec.length];
        bytes[spec.offset..data_end].copy_from_slice(&spec.data);

        self.blocks.push(MemoryBlock {
            start: spec.start,
            end: new_end,
            readonly: spec.readonly,
            snapshot: bytes.clone().into_boxed_slice(),
            bytes,
        });

        Ok(())
    }

    fn block(&self, addr: u16) -> Result<&MemoryBlock, MemoryError> {
        self.blocks
            .iter()
            .find(|b| b.contains(addr))
            .ok_or(MemoryError::Unmapped { address: addr })
    }

    /// Locates the block and offset a write to `addr` would land in.
    fn writable_slot(&self, addr: u16) -> Result<(usize, usize), MemoryError> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.contains(addr))
            .ok_or(MemoryError::Unmapped { address: addr })?;

        let block = &self.blocks[index];
        if block.readonly {
            return Err(MemoryError::ReadOnly { address: addr });
        }

        Ok((index, (addr - block.start) as usize))
    }

    /// Reads the byte at `addr`.
    pub fn read(&self, addr: u16) -> Result<u8, MemoryError> {
        let block = self.block(addr)?;
        Ok(block.bytes[(addr - block.start) as usize])
    }

    /// Writes `value` at `addr`.
    ///
    /// Fails without touching memory if `addr` is unmapped or read-only.
    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError> {
        let (index, offset) = self.writable_slot(addr)?;
        self.blocks[index].bytes[offset] = value;
        Ok(())
    }

    /// Writes the low 8 bits of a wider value.
    pub fn write_masked(&mut self, addr: u16, value: u16) -> Result<(), MemoryError> {
        self.write(addr, (value & 0xFF) as u8)
    }

    /// Reads a little-endian word from `addr` and `addr + 1` (wrapping).
    pub fn read_word(&self, addr: u16) -> Result<u16, MemoryError> {
        let low = self.read(addr)? as u16;
        let high = self.read(addr.wrapping_add(1))? as u16;
        Ok((high << 8) | low)
    }

    /// Writes a little-endian word, low byte first.
    ///
    /// Both addresses are checked before anything is stored.
    pub fn write_word(&mut self, addr: u16, value: u16) -> Result<(), MemoryError> {
        let high_addr = addr.wrapping_add(1);
        let (low_block, low_offset) = self.writable_slot(addr)?;
        let (high_block, high_offset) = self.writable_slot(high_addr)?;

        self.blocks[low_block].bytes[low_offset] = (value & 0xFF) as u8;
        self.blocks[high_block].bytes[high_offset] = (value >> 8) as u8;
        Ok(())
    }

    /// Restores every block to its construction-time contents.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.bytes.copy_from_slice(&block.snapshot);
        }
    }

    /// Returns true if some block covers `addr`.
    pub fn contains(&self, addr: u16) -> bool {
        self.blocks.iter().any(|b| b.contains(addr))
    }

    /// Iterates `(start, length, readonly)` for each block in construction order.
    pub fn blocks(&self) -> impl Iterator<Item = (u16, usize, bool)> + '_ {
        self.blocks
            .iter()
            .map(|b| (b.start, b.bytes.len(), b.readonly))
    }
}

impl MemoryBus for MemorySpace {
    fn read(&self, addr: u16) -> Result<u8, MemoryError> {
        MemorySpace::read(self, addr)
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError> {
        MemorySpace::write(self, addr, value)
    }

    fn read_word(&self, addr: u16) -> Result<u16, MemoryError> {
        MemorySpace::read_word(self, addr)
    }

    fn write_word(&mut self, addr: u16, value: u16) -> Result<(), MemoryError> {
        MemorySpace::write_word(self, addr, value)
    }
}
