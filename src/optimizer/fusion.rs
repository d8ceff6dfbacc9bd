//! Pass 3 — fusion pattern detection (spec §4.3). Report-only: scans for
//! `LOAD, COMPUTE, STORE` windows where the load feeds the compute, up to
//! a fixed cap of 256 patterns. No IR rewrite happens here; the current
//! encoders do not consume this, so only the count is persisted.

use crate::ir::{Instruction, Module, Op};
use itertools::Itertools;

/// The fixed cap on how many fusion candidates this pass records (spec
/// §5 resource discipline: a fixed-size pattern array, stack-scoped).
pub const MAX_PATTERNS: usize = 256;

pub fn run(module: &Module) -> usize {
    module
        .instructions()
        .iter()
        .tuple_windows()
        .filter(|(load, compute, store)| is_fusible(load, compute, store))
        .take(MAX_PATTERNS)
        .count()
}

fn is_fusible(load: &Instruction, compute: &Instruction, store: &Instruction) -> bool {
    load.op == Op::LoadF32
        && compute.op.is_arithmetic()
        && store.op == Op::StoreF32
        && (load.dst == compute.src1 || load.dst == compute.src2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(op: Op, dst: u8, src1: u8, src2: u8) -> Instruction {
        let mut i = Instruction::new(op);
        i.dst = dst;
        i.src1 = src1;
        i.src2 = src2;
        i
    }

    #[test]
    fn counts_a_single_load_compute_store_window() {
        let mut module = Module::new("t");
        module.push(instr(Op::LoadF32, 0, 0, 0));
        module.push(instr(Op::AddF32, 1, 0, 2));
        module.push(instr(Op::StoreF32, 1, 0, 0));

        assert_eq!(run(&module), 1);
    }

    #[test]
    fn does_not_count_a_window_where_the_load_does_not_feed_the_compute() {
        let mut module = Module::new("t");
        module.push(instr(Op::LoadF32, 0, 0, 0));
        module.push(instr(Op::AddF32, 1, 5, 2));
        module.push(instr(Op::StoreF32, 1, 0, 0));

        assert_eq!(run(&module), 0);
    }

    #[test]
    fn caps_at_256_patterns() {
        let mut module = Module::new("t");
        for _ in 0..300 {
            module.push(instr(Op::LoadF32, 0, 0, 0));
            module.push(instr(Op::AddF32, 1, 0, 2));
            module.push(instr(Op::StoreF32, 1, 0, 0));
        }
        assert_eq!(run(&module), MAX_PATTERNS);
    }
}
