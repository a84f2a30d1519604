//! Shared fixtures for integration tests.
//!
//! `MiniCpu` executes the handful of opcodes the test programs use. It is
//! not a 6502 model; it exists so the tracer can be driven end to end.

#![allow(dead_code)]

use trace6502::{BlockSpec, MemoryError, MemorySpace, Processor, Registers};

#[derive(Debug, thiserror::Error)]
pub enum MiniCpuError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("opcode ${opcode:02X} at ${pc:04X} is not supported")]
    Unsupported { opcode: u8, pc: u16 },
}

/// Executes LDA/LDX #imm, STA zp, INX, DEX, BNE, JMP abs, JSR, RTS, NOP
/// and BRK (which stops at itself).
pub struct MiniCpu {
    pub regs: Registers,
    pub memory: MemorySpace,
    pub steps: u64,
}

impl MiniCpu {
    pub fn new(memory: MemorySpace) -> Self {
        Self {
            regs: Registers::default(),
            memory,
            steps: 0,
        }
    }

    fn fetch(&mut self) -> Result<u8, MemoryError> {
        let byte = self.memory.read(self.regs.pc)?;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        Ok(byte)
    }

    fn fetch_word(&mut self) -> Result<u16, MemoryError> {
        let low = self.fetch()? as u16;
        let high = self.fetch()? as u16;
        Ok(high << 8 | low)
    }

    fn push(&mut self, value: u8) -> Result<(), MemoryError> {
        self.memory.write(0x0100 | self.regs.sp as u16, value)?;
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        Ok(())
    }

    fn pull(&mut self) -> Result<u8, MemoryError> {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        self.memory.read(0x0100 | self.regs.sp as u16)
    }

    fn set_nz(&mut self, value: u8) {
        self.regs.p &= !0b1000_0010;
        if value == 0 {
            self.regs.p |= 0b0000_0010;
        }
        if value & 0x80 != 0 {
            self.regs.p |= 0b1000_0000;
        }
    }
}

impl Processor for MiniCpu {
    type Error = MiniCpuError;

    fn step(&mut self) -> Result<(), MiniCpuError> {
        let pc = self.regs.pc;
        let opcode = self.fetch()?;

        match opcode {
            0x00 => self.regs.pc = pc,
            0xEA => {}
            0xA9 => {
                self.regs.a = self.fetch()?;
                self.set_nz(self.regs.a);
            }
            0xA2 => {
                self.regs.x = self.fetch()?;
                self.set_nz(self.regs.x);
            }
            0x85 => {
                let zp = self.fetch()?;
                self.memory.write(zp as u16, self.regs.a)?;
            }
            0xE8 => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.set_nz(self.regs.x);
            }
            0xCA => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.set_nz(self.regs.x);
            }
            0xD0 => {
                let offset = self.fetch()? as i8;
                if self.regs.p & 0b0000_0010 == 0 {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                }
            }
            0x4C => self.regs.pc = self.fetch_word()?,
            0x20 => {
                let target = self.fetch_word()?;
                let ret = self.regs.pc.wrapping_sub(1);
                self.push((ret >> 8) as u8)?;
                self.push(ret as u8)?;
                self.regs.pc = target;
            }
            0x60 => {
                let low = self.pull()? as u16;
                let high = self.pull()? as u16;
                self.regs.pc = (high << 8 | low).wrapping_add(1);
            }
            _ => return Err(MiniCpuError::Unsupported { opcode, pc }),
        }

        self.steps += 1;
        Ok(())
    }

    fn reset(&mut self, pc: u16) {
        self.regs = Registers {
            pc,
            sp: 0xFF,
            p: 0b0010_0100,
            ..Registers::default()
        };
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn memory(&self) -> &MemorySpace {
        &self.memory
    }
}

/// 64KB of RAM with `program` at `origin`.
pub fn ram_with(origin: u16, program: &[u8]) -> MemorySpace {
    MemorySpace::new([BlockSpec::ram(0x0000, 0x10000)
        .with_data(program.to_vec())
        .at_offset(origin as usize)])
    .unwrap()
}

/// One ACME report row: number, dump columns, source from column 32.
pub fn acme_row(number: usize, dump: &str, source: &str) -> String {
    format!("{:6}  {:<24}{}", number, dump, source)
}

/// An ACME report with the two header lines and one row per entry.
pub fn acme_report(rows: &[(&str, &str)]) -> String {
    let mut text = String::from("; ******** Source: main.a\n\n");
    for (i, (dump, source)) in rows.iter().enumerate() {
        text.push_str(&acme_row(i + 1, dump, source));
        text.push('\n');
    }
    text
}
