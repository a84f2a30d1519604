//! # Opcode Cycle Costs
//!
//! The listing parsers annotate every instruction line with the base cycle
//! cost of its opcode. The cost table belongs to the processor model; the
//! parsers receive it as an injected `CycleTable` instead of carrying their
//! own copy.
//!
//! `CycleTable::nmos()` provides the documented NMOS 6502 base costs
//! (page-crossing and branch-taken penalties excluded). Undocumented opcodes
//! cost 0.

/// `JSR absolute`, the only subroutine call on the 6502.
pub const OPCODE_JSR: u8 = 0x20;

/// `BRK`, treated as the program's halt instruction while tracing.
pub const OPCODE_BRK: u8 = 0x00;

/// Base cycles for every NMOS 6502 opcode, one row per high nibble.
#[rustfmt::skip]
const NMOS_BASE_CYCLES: [u8; 256] = [
    // x0 x1 x2 x3 x4 x5 x6 x7 x8 x9 xA xB xC xD xE xF
    7, 6, 0, 0, 0, 3, 5, 0, 3, 2, 2, 0, 0, 4, 6, 0, // 0x
    2, 5, 0, 0, 0, 4, 6, 0, 2, 4, 0, 0, 0, 4, 7, 0, // 1x
    6, 6, 0, 0, 3, 3, 5, 0, 4, 2, 2, 0, 4, 4, 6, 0, // 2x
    2, 5, 0, 0, 0, 4, 6, 0, 2, 4, 0, 0, 0, 4, 7, 0, // 3x
    6, 6, 0, 0, 0, 3, 5, 0, 3, 2, 2, 0, 3, 4, 6, 0, // 4x
    2, 5, 0, 0, 0, 4, 6, 0, 2, 4, 0, 0, 0, 4, 7, 0, // 5x
    6, 6, 0, 0, 0, 3, 5, 0, 4, 2, 2, 0, 5, 4, 6, 0, // 6x
    2, 5, 0, 0, 0, 4, 6, 0, 2, 4, 0, 0, 0, 4, 7, 0, // 7x
    0, 6, 0, 0, 3, 3, 3, 0, 2, 0, 2, 0, 4, 4, 4, 0, // 8x
    2, 6, 0, 0, 4, 4, 4, 0, 2, 5, 2, 0, 0, 5, 0, 0, // 9x
    2, 6, 2, 0, 3, 3, 3, 0, 2, 2, 2, 0, 4, 4, 4, 0, // Ax
    2, 5, 0, 0, 4, 4, 4, 0, 2, 4, 2, 0, 4, 4, 4, 0, // Bx
    2, 6, 0, 0, 3, 3, 5, 0, 2, 2, 2, 0, 4, 4, 6, 0, // Cx
    2, 5, 0, 0, 0, 4, 6, 0, 2, 4, 0, 0, 0, 4, 7, 0, // Dx
    2, 6, 0, 0, 3, 3, 5, 0, 2, 2, 2, 0, 4, 4, 6, 0, // Ex
    2, 5, 0, 0, 0, 4, 6, 0, 2, 4, 0, 0, 0, 4, 7, 0, // Fx
];

/// Read-only `opcode -> cycles` lookup.
///
/// # Examples
///
/// ```
/// use trace6502::CycleTable;
///
/// let table = CycleTable::nmos();
/// assert_eq!(table.cycles(0xA9), 2); // LDA #imm
/// assert_eq!(table.cycles(0x85), 3); // STA zp
/// assert_eq!(table.cycles(0x00), 7); // BRK
///
/// // A processor model with its own timing can supply a table
/// let custom = CycleTable::from_fn(|opcode| if opcode == 0xEA { 1 } else { 2 });
/// assert_eq!(custom.cycles(0xEA), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleTable {
    cycles: [u32; 256],
}

impl CycleTable {
    /// Documented NMOS 6502 base cycle costs.
    pub fn nmos() -> Self {
        Self::from_fn(|opcode| NMOS_BASE_CYCLES[opcode as usize] as u32)
    }

    /// Builds a table by querying `cost` once per opcode.
    pub fn from_fn(mut cost: impl FnMut(u8) -> u32) -> Self {
        let mut cycles = [0; 256];
        for (opcode, slot) in cycles.iter_mut().enumerate() {
            *slot = cost(opcode as u8);
        }
        Self { cycles }
    }

    /// Base cycle cost of `opcode`.
    pub fn cycles(&self, opcode: u8) -> u32 {
        self.cycles[opcode as usize]
    }
}

impl Default for CycleTable {
    fn default() -> Self {
        Self::nmos()
    }
}

impl From<[u32; 256]> for CycleTable {
    fn from(cycles: [u32; 256]) -> Self {
        Self { cycles }
    }
}
