//! # 6502 Source-Level Tracer
//!
//! Correlates a running 6502 program with the assembler listing that
//! produced it, so a program can be stepped line by line, subroutines
//! stepped over, and cycle costs totalled over chosen source ranges.
//!
//! The crate does not execute instructions. It supplies the pieces around
//! an instruction-level processor model:
//!
//! - a segmented, protection-aware address space (`MemorySpace`)
//! - listing parsers for ACME reports and ca65 listings (`Listing`)
//! - a stepping controller that drives any `Processor` (`TraceController`)
//!
//! ## Quick Start
//!
//! ```rust
//! use trace6502::{listing::acme, BlockSpec, CycleTable, MemorySpace};
//!
//! let report = [
//!     "; ******** Source: demo.a",
//!     "",
//!     "     1                          *= $0800",
//!     "     2  0800 a901               start:  lda #$01",
//!     "     3  0802 8500                       sta $00",
//!     "     4  0804 00                         brk",
//! ]
//! .join("\n");
//!
//! let mut listing = acme::parse(&report, &CycleTable::nmos());
//! assert_eq!(listing.locate(0x0803), Some(2));
//!
//! // LDA #imm + STA zp
//! assert_eq!(listing.mark_cycle_ranges(&[trace6502::CycleRange::new(1, 2)]).unwrap(), 5);
//!
//! let memory = MemorySpace::new([BlockSpec::ram(0x0000, 0x10000)]).unwrap();
//! assert!(memory.contains(0xFFFF));
//! ```
//!
//! ## Modules
//!
//! - `memory` - `MemorySpace`, `BlockSpec` and the `MemoryBus` trait
//! - `cycles` - opcode cycle costs
//! - `listing` - listing parsers, address index and cycle-range queries
//! - `processor` - the `Processor` trait a 6502 model implements
//! - `trace` - `TraceController` and its stepping modes
//! - `loader` - binary images and the memory map built from them
//! - `config` - session start-up

pub mod config;
pub mod cycles;
pub mod error;
pub mod listing;
pub mod loader;
pub mod memory;
pub mod processor;
pub mod trace;

mod number;

// Re-export public API
pub use config::{ImageSpec, ListingSource, Session, SessionConfig, DEFAULT_ENTRY};
pub use cycles::{CycleTable, OPCODE_BRK, OPCODE_JSR};
pub use error::ConfigError;
pub use listing::{
    AddressIndex, CycleRange, LineInfo, Listing, ListingError, QueryError, WatchLocation, Width,
};
pub use memory::{BlockSpec, MemoryBus, MemoryError, MemorySpace};
pub use processor::{Processor, Registers};
pub use trace::{AbortHandle, StepOutcome, TraceController, WatchValue};
