//! RISC-V RVV encoder (spec §4.4.3). Every instruction is a single 4-byte,
//! little-endian word. The body is preceded by a `vsetvli` that programs
//! 32-bit elements at `LMUL=1` for the remainder of the function.
//! `CMP_EQ_F32`/`LOOP_BEGIN`/`LOOP_END`/`NOP` have no base opcode here and
//! are counted as skipped.

use super::{Encoder, EncodeError, Writer};
use crate::bits::mask;
use crate::ir::{Instruction, Module, Op, NO_MASK};

const PROLOGUE: [u32; 2] = [
    0xFF010113, // addi sp, sp, -16
    0x00113423, // sd ra, 8(sp)
];

/// `vsetvli t0, x0, e32, m1` — programs 32-bit elements, LMUL=1 (spec §4.4.3).
const VSETVLI: u32 = 0xC0007257;

const EPILOGUE: [u32; 3] = [
    0x00813083, // ld ra, 8(sp)
    0x01010113, // addi sp, sp, 16
    0x00008067, // ret (jalr x0, x1, 0)
];

pub struct RiscvEncoder;

impl Encoder for RiscvEncoder {
    fn fill_byte(&self) -> u8 {
        0x00
    }

    fn encode(&self, module: &Module, writer: &mut Writer) -> Result<usize, EncodeError> {
        for word in PROLOGUE {
            writer.write_u32_le(word)?;
        }
        writer.write_u32_le(VSETVLI)?;

        let mut skipped = 0usize;
        for instr in module.instructions() {
            match word_for(instr) {
                Some(word) => writer.write_u32_le(word)?,
                None => skipped += 1,
            }
        }
        for word in EPILOGUE {
            writer.write_u32_le(word)?;
        }
        Ok(skipped)
    }
}

/// Build the 4-byte instruction word for one IR instruction, per the base
/// opcode table in spec §4.4.3. Returns `None` when `instr.op` has no RVV
/// encoding in this version.
fn word_for(instr: &Instruction) -> Option<u32> {
    let vm: u32 = if instr.mask_reg == NO_MASK { 0 } else { 1 };
    // Each field is 5 bits wide; masking keeps a register index from
    // bleeding into the next field if it ever exceeds the field width.
    let field5 = mask::<u32>(5);
    let reg_fields = |base: u32, vd: u8, vs1: u8, vs2: u8| -> u32 {
        base
            | (((vd as u32) & field5) << 7)
            | (((vs1 as u32) & field5) << 15)
            | (((vs2 as u32) & field5) << 20)
            | (vm << 25)
    };

    let word = match instr.op {
        Op::AddF32 => reg_fields(0x00001057, instr.dst, instr.src1, instr.src2),
        Op::SubF32 => reg_fields(0x08001057, instr.dst, instr.src1, instr.src2),
        Op::MulF32 => reg_fields(0x10001057, instr.dst, instr.src1, instr.src2),
        Op::DivF32 => reg_fields(0x18001057, instr.dst, instr.src1, instr.src2),
        Op::CmpLtF32 => reg_fields(0x6E005057, instr.dst, instr.src1, instr.src2),
        Op::AndMask => reg_fields(0x24001057, instr.dst, instr.src1, instr.src2),
        Op::OrMask => reg_fields(0x28001057, instr.dst, instr.src1, instr.src2),
        Op::SetZero => 0x40005057 | (((instr.dst as u32) & field5) << 7),
        Op::LoadF32 => 0x06000007 | (((instr.dst as u32) & field5) << 7) | (1 << 15),
        Op::StoreF32 => 0x04000027 | (((instr.dst as u32) & field5) << 7) | (1 << 15),
        _ => return None,
    };
    Some(word)
}
