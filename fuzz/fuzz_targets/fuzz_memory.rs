//! Fuzz target for the address space.
//!
//! Builds an address space from arbitrary block requests, then applies
//! arbitrary accesses. A failed access must never change memory.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use trace6502::{BlockSpec, MemorySpace};

#[derive(Debug, Arbitrary)]
struct FuzzBlock {
    start: u16,
    length: u16,
    readonly: bool,
    data: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
enum Access {
    Write { addr: u16, value: u8 },
    WriteWord { addr: u16, value: u16 },
    Read { addr: u16 },
    Reset,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    blocks: Vec<FuzzBlock>,
    accesses: Vec<Access>,
}

fn snapshot(memory: &MemorySpace, addrs: &[u16]) -> Vec<Option<u8>> {
    addrs.iter().map(|&a| memory.read(a).ok()).collect()
}

fuzz_target!(|input: FuzzInput| {
    let specs = input.blocks.into_iter().map(|b| {
        let spec = if b.readonly {
            BlockSpec::rom(b.start, b.length as usize)
        } else {
            BlockSpec::ram(b.start, b.length as usize)
        };
        spec.with_data(b.data)
    });

    let Ok(mut memory) = MemorySpace::new(specs) else {
        return;
    };

    for access in input.accesses {
        match access {
            Access::Write { addr, value } => {
                let before = snapshot(&memory, &[addr]);
                if memory.write(addr, value).is_err() {
                    assert_eq!(before, snapshot(&memory, &[addr]));
                }
            }
            Access::WriteWord { addr, value } => {
                let addrs = [addr, addr.wrapping_add(1)];
                let before = snapshot(&memory, &addrs);
                if memory.write_word(addr, value).is_err() {
                    assert_eq!(before, snapshot(&memory, &addrs));
                }
            }
            Access::Read { addr } => {
                assert_eq!(memory.read(addr).is_ok(), memory.contains(addr));
            }
            Access::Reset => memory.reset(),
        }
    }
});
