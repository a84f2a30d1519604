//! # Source-Level Tracing
//!
//! `TraceController` drives a [`Processor`] through the stepping modes a
//! source-level debugger needs and keeps the program counter correlated with
//! the [`Listing`]:
//!
//! - `step()`: one instruction
//! - `step_over()`: a `JSR` runs until the stack pointer returns to its
//!   pre-call value; `BRK` is treated as a halt
//! - `run_until_return_to_pc()`: run until PC comes back to where it was,
//!   which finishes one iteration of a loop
//!
//! The looping modes have no built-in bound. A step ceiling can be set with
//! [`TraceController::with_step_limit`], and any thread holding an
//! [`AbortHandle`] can stop them between two instructions.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};

use crate::cycles::{CycleTable, OPCODE_BRK, OPCODE_JSR};
use crate::listing::{parse_ranges, CycleRange, Listing, QueryError, WatchLocation, Width};
use crate::memory::{MemoryError, MemorySpace};
use crate::processor::{Processor, Registers};

/// Shared flag that stops a running step loop.
///
/// Cloning yields another handle to the same flag.
///
/// # Examples
///
/// ```
/// use trace6502::AbortHandle;
///
/// let handle = AbortHandle::default();
/// let remote = handle.clone();
///
/// std::thread::spawn(move || remote.raise()).join().unwrap();
/// assert!(handle.is_raised());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Requests that the running loop stop at the next instruction boundary.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Lowers the flag and reports whether it was raised.
    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// How a stepping operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The operation ran to its natural end.
    Completed { instructions: u64 },

    /// The instruction at PC is `BRK`; nothing was executed.
    Halted,

    /// The abort flag was raised; stopped after `instructions`.
    Aborted { instructions: u64 },

    /// The step ceiling was hit; stopped after `instructions`.
    LimitReached { instructions: u64 },
}

impl StepOutcome {
    /// Instructions executed by the operation.
    pub fn instructions(&self) -> u64 {
        match *self {
            StepOutcome::Halted => 0,
            StepOutcome::Completed { instructions }
            | StepOutcome::Aborted { instructions }
            | StepOutcome::LimitReached { instructions } => instructions,
        }
    }
}

/// Current value of one watch location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchValue {
    pub label: Option<String>,
    pub address: u16,
    pub width: Width,

    /// The value read, or the fault that prevented reading it
    pub value: Result<u16, MemoryError>,
}

impl WatchValue {
    /// Reads `location` from `memory`: a byte, or a little-endian word.
    pub fn read(memory: &MemorySpace, location: &WatchLocation) -> Self {
        Self {
            label: location.label.clone(),
            address: location.address,
            width: location.width,
            value: match location.width {
                Width::Byte => memory.read(location.address).map(u16::from),
                Width::Word => memory.read_word(location.address),
            },
        }
    }
}

impl fmt::Display for WatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}: ", label)?,
            None => write!(f, "${:04X}: ", self.address)?,
        }

        match (&self.value, self.width) {
            (Ok(value), Width::Byte) => write!(f, "${:02X} ({})", value, value),
            (Ok(value), Width::Word) => write!(f, "${:04X} ({})", value, value),
            (Err(err), _) => write!(f, "{}", err),
        }
    }
}

/// Couples a processor with the listing of the program it runs.
pub struct TraceController<P: Processor> {
    processor: P,
    listing: Listing,
    entry: u16,
    cycle_table: CycleTable,
    step_limit: Option<u64>,
    abort: AbortHandle,
}

impl<P: Processor> TraceController<P> {
    /// Takes ownership of `processor` and resets it to `entry`.
    pub fn new(mut processor: P, listing: Listing, entry: u16) -> Self {
        processor.reset(entry);

        Self {
            processor,
            listing,
            entry,
            cycle_table: CycleTable::nmos(),
            step_limit: None,
            abort: AbortHandle::default(),
        }
    }

    /// Bounds every looping operation to `limit` instructions.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Replaces the table used for the status line's opcode cost.
    pub fn with_cycle_table(mut self, table: CycleTable) -> Self {
        self.cycle_table = table;
        self
    }

    /// A handle that stops `step_over` and `run_until_return_to_pc`.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Address `reset()` restarts from.
    pub fn entry(&self) -> u16 {
        self.entry
    }

    pub fn registers(&self) -> Registers {
        self.processor.registers()
    }

    /// Line to highlight for the current PC, `0` when none is close.
    pub fn current_line(&self) -> usize {
        self.locate_pc().unwrap_or(0)
    }

    /// Line for the current PC, if the PC falls on or just after one.
    pub fn locate_pc(&self) -> Option<usize> {
        self.listing.locate(self.processor.registers().pc)
    }

    /// Executes exactly one instruction.
    ///
    /// # Errors
    ///
    /// Propagates the processor's fault; the processor state is whatever
    /// the model left behind.
    pub fn step(&mut self) -> Result<StepOutcome, P::Error> {
        self.single_step()?;
        Ok(StepOutcome::Completed { instructions: 1 })
    }

    /// Steps over a subroutine call.
    ///
    /// A `JSR` at PC runs until the stack pointer is back to its value
    /// before the call. A `BRK` at PC executes nothing. Anything else is a
    /// plain [`step`](Self::step).
    pub fn step_over(&mut self) -> Result<StepOutcome, P::Error> {
        let regs = self.processor.registers();

        match self.processor.memory().read(regs.pc) {
            Ok(OPCODE_JSR) => {
                let caller_sp = regs.sp;
                let outcome = self.run_while(|p| p.registers().sp != caller_sp)?;
                debug!("stepped over JSR at ${:04X}: {:?}", regs.pc, outcome);
                Ok(outcome)
            }
            Ok(OPCODE_BRK) => {
                debug!("BRK at ${:04X}, not stepping", regs.pc);
                Ok(StepOutcome::Halted)
            }
            _ => self.step(),
        }
    }

    /// Runs until PC equals its value at the call, executing at least one
    /// instruction.
    pub fn run_until_return_to_pc(&mut self) -> Result<StepOutcome, P::Error> {
        let start = self.processor.registers().pc;
        let outcome = self.run_while(|p| p.registers().pc != start)?;
        debug!("run until ${:04X}: {:?}", start, outcome);
        Ok(outcome)
    }

    /// Restarts the processor at the entry address. Memory is untouched.
    pub fn reset(&mut self) {
        debug!("reset to ${:04X}", self.entry);
        self.processor.reset(self.entry);
    }

    /// Marks cycle totals over `ranges`; see [`Listing::mark_cycle_ranges`].
    pub fn mark_cycle_ranges(&mut self, ranges: &[CycleRange]) -> Result<u64, QueryError> {
        self.listing.mark_cycle_ranges(ranges)
    }

    /// Parses a cycle-range query and marks it.
    ///
    /// # Errors
    ///
    /// Any query error leaves every mark as it was.
    pub fn mark_cycles(&mut self, query: &str) -> Result<u64, QueryError> {
        let ranges = parse_ranges(query, self.listing.lines())?;
        self.listing.mark_cycle_ranges(&ranges)
    }

    /// Reads every watch location from the processor's memory.
    pub fn watch_values(&self) -> Vec<WatchValue> {
        let memory = self.processor.memory();

        self.listing
            .watch_locations()
            .iter()
            .map(|location| WatchValue::read(memory, location))
            .collect()
    }

    /// One-line register summary.
    ///
    /// `PC=$0800 A:$01,001 X:$00,000 Y:$00,000 Flags:________ opcode:85 cycles:3`
    pub fn status_line(&self) -> String {
        let regs = self.processor.registers();

        let (opcode, cycles) = match self.processor.memory().read(regs.pc) {
            Ok(opcode) => (
                format!("{:02X}", opcode),
                self.cycle_table.cycles(opcode).to_string(),
            ),
            Err(_) => ("--".to_string(), "-".to_string()),
        };

        format!(
            "PC=${:04X} A:${:02X},{:03} X:${:02X},{:03} Y:${:02X},{:03} Flags:{} opcode:{} cycles:{}",
            regs.pc,
            regs.a,
            regs.a,
            regs.x,
            regs.x,
            regs.y,
            regs.y,
            regs.flags(),
            opcode,
            cycles
        )
    }

    fn single_step(&mut self) -> Result<(), P::Error> {
        trace!("step at ${:04X}", self.processor.registers().pc);
        self.processor.step()
    }

    /// Executes one instruction, then keeps going while `keep_going` holds,
    /// checking the abort flag and the ceiling between instructions.
    fn run_while(&mut self, keep_going: impl Fn(&P) -> bool) -> Result<StepOutcome, P::Error> {
        self.single_step()?;
        let mut instructions = 1;

        while keep_going(&self.processor) {
            if self.abort.take() {
                return Ok(StepOutcome::Aborted { instructions });
            }
            if self.step_limit.is_some_and(|limit| instructions >= limit) {
                return Ok(StepOutcome::LimitReached { instructions });
            }

            self.single_step()?;
            instructions += 1;
        }

        Ok(StepOutcome::Completed { instructions })
    }
}
