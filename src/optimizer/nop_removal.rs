//! Pass 1 — NOP removal (spec §4.3). Compact the sequence, dropping every
//! `Nop`, in O(n). Also the pass that mops up the `Nop`s pass 4 (CSE)
//! deliberately leaves behind, since the pipeline does not re-run pass 1
//! after pass 4 — downstream passes (3, 5, 6) all tolerate residual `Nop`s.

use crate::ir::{Module, Op};

pub fn run(module: &mut Module) {
    module.retain(|instr| instr.op != Op::Nop);
}
