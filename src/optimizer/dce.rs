//! Pass 2 — dead-code elimination (spec §4.3).
//!
//! The abstract machine (spec §4.2) has 16 vector registers and two
//! implicit pointer registers used only by loads/stores. Backward
//! data-flow over a straight-line program: seed the `used` set with every
//! `StoreF32.dst` (an output), then close it under "an instruction whose
//! `dst` is used also makes its sources used." `LoadF32`/`StoreF32` are
//! always kept regardless of liveness (spec invariant 4 — they are
//! side-effecting); everything else is kept only if its `dst` is live.
//! This does not model control-flow merges — it is a straight-line
//! analysis, per spec's stated tie-break.

use crate::ir::{Module, NUM_REGISTERS};
use std::collections::HashSet;

pub fn run(module: &mut Module) {
    let used = live_registers(module.instructions());
    module.retain(|instr| instr.is_side_effecting() || used.contains(&instr.dst));
}

fn live_registers(instructions: &[crate::ir::Instruction]) -> HashSet<u8> {
    let mut used: HashSet<u8> = HashSet::new();
    for instr in instructions {
        if instr.op == crate::ir::Op::StoreF32 {
            used.insert(instr.dst);
        }
    }

    loop {
        let mut changed = false;
        for instr in instructions {
            if used.contains(&instr.dst) {
                for reg in [instr.src1, instr.src2] {
                    if reg < NUM_REGISTERS && used.insert(reg) {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    used
}
