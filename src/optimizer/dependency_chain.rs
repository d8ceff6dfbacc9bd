//! Pass 5 — dependency-chain analysis (spec §4.3). Report-only: a coarse
//! proxy for instruction-level parallelism. Walk the sequence tracking the
//! destination of the previous instruction; whenever the current
//! instruction reads that register (as either source), the chain extends,
//! otherwise it resets to 1. Emits the running maximum.

use crate::ir::Module;

pub fn run(module: &Module) -> usize {
    let mut max_chain = 0usize;
    let mut chain = 0usize;
    let mut last_dst: Option<u8> = None;

    for instr in module.instructions() {
        let continues = last_dst
            .map(|d| instr.src1 == d || instr.src2 == d)
            .unwrap_or(false);
        chain = if continues { chain + 1 } else { 1 };
        max_chain = max_chain.max(chain);
        last_dst = Some(instr.dst);
    }

    max_chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, Op};

    fn instr(op: Op, dst: u8, src1: u8, src2: u8) -> Instruction {
        let mut i = Instruction::new(op);
        i.dst = dst;
        i.src1 = src1;
        i.src2 = src2;
        i
    }

    #[test]
    fn empty_module_reports_zero() {
        let module = Module::new("t");
        assert_eq!(run(&module), 0);
    }

    #[test]
    fn single_instruction_reports_one() {
        let mut module = Module::new("t");
        module.push(instr(Op::AddF32, 0, 1, 2));
        assert_eq!(run(&module), 1);
    }

    #[test]
    fn a_chain_of_three_dependent_instructions_reports_three() {
        let mut module = Module::new("t");
        module.push(instr(Op::AddF32, 0, 1, 2)); // r0 = r1+r2
        module.push(instr(Op::MulF32, 3, 0, 0)); // r3 = r0*r0, depends on r0
        module.push(instr(Op::SubF32, 4, 3, 3)); // r4 = r3-r3, depends on r3
        assert_eq!(run(&module), 3);
    }

    #[test]
    fn independent_instructions_reset_the_chain() {
        let mut module = Module::new("t");
        module.push(instr(Op::AddF32, 0, 1, 2));
        module.push(instr(Op::AddF32, 5, 6, 7)); // unrelated
        module.push(instr(Op::AddF32, 8, 9, 10)); // unrelated
        assert_eq!(run(&module), 1);
    }

    #[test]
    fn never_exceeds_module_length() {
        let mut module = Module::new("t");
        for n in 0..5u8 {
            module.push(instr(Op::AddF32, n, n, n));
        }
        assert!(run(&module) <= module.len());
        assert!(run(&module) >= 1);
    }
}
