//! # Processor Seam
//!
//! The tracer never decodes instructions itself. Any 6502 model that can
//! execute one instruction, restart at an address and report its registers
//! can be driven by [`TraceController`](crate::TraceController).
//!
//! The model owns the [`MemorySpace`] it executes against; the tracer only
//! reads it (to inspect the opcode at PC and to show watch values).

use crate::memory::MemorySpace;

/// Snapshot of the programmer-visible 6502 registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    /// Program counter (address of next instruction)
    pub pc: u16,

    /// Accumulator register
    pub a: u8,

    /// X index register
    pub x: u8,

    /// Y index register
    pub y: u8,

    /// Stack pointer (0x0100 + sp gives full stack address)
    pub sp: u8,

    /// Status register packed as NV-BDIZC
    pub p: u8,
}

/// Flag letters indexed by bit number. Bit 5 has no flag and always shows `_`.
const FLAG_LETTERS: [char; 8] = ['C', 'Z', 'I', 'D', 'B', '_', 'V', 'N'];

impl Registers {
    /// Renders the status register as eight characters, bit 0 (`C`) first.
    ///
    /// A set flag shows its letter, a clear flag shows `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use trace6502::Registers;
    ///
    /// let regs = Registers { p: 0b0010_0101, ..Registers::default() };
    /// assert_eq!(regs.flags(), "C_I_____");
    /// ```
    pub fn flags(&self) -> String {
        FLAG_LETTERS
            .iter()
            .enumerate()
            .map(|(bit, &letter)| {
                if self.p & (1 << bit) != 0 {
                    letter
                } else {
                    '_'
                }
            })
            .collect()
    }

    pub fn flag_n(&self) -> bool {
        self.p & 0b1000_0000 != 0
    }

    pub fn flag_z(&self) -> bool {
        self.p & 0b0000_0010 != 0
    }

    pub fn flag_c(&self) -> bool {
        self.p & 0b0000_0001 != 0
    }
}

/// An instruction-level 6502 model.
///
/// Implementations execute against a [`MemorySpace`] they own. Execution
/// faults (an unmapped fetch, an undefined opcode) surface through
/// [`Processor::Error`] and stop whatever loop the tracer is running.
pub trait Processor {
    /// Fault raised by a single step.
    type Error: std::error::Error;

    /// Executes exactly one instruction.
    fn step(&mut self) -> Result<(), Self::Error>;

    /// Puts the processor in its start-up state with PC at `pc`.
    ///
    /// Memory is not touched.
    fn reset(&mut self, pc: u16);

    /// Current register values.
    fn registers(&self) -> Registers;

    /// The memory the processor executes against.
    fn memory(&self) -> &MemorySpace;
}
