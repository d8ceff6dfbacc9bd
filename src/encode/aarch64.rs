//! AArch64 encoder (spec §4.4.2). Every instruction is a single 4-byte,
//! little-endian word: a fixed base opcode with register fields ORed in.
//! `CMP_EQ_F32`/`AND_MASK`/`OR_MASK`/`LOOP_BEGIN`/`LOOP_END`/`NOP` have no
//! template here and are counted as skipped.

use super::{Encoder, EncodeError, Writer};
use crate::bits::mask;
use crate::ir::{Instruction, Module, Op};

const PROLOGUE: [u32; 3] = [
    0xA9BF7BFD, // stp fp, lr, [sp, #-16]!
    0x910003FD, // mov fp, sp
    0xD10403FF, // sub sp, sp, #0x100
];

const EPILOGUE: [u32; 3] = [
    0x910403FF, // add sp, sp, #0x100
    0xA8C17BFD, // ldp fp, lr, [sp], #16
    0xD65F03C0, // ret
];

pub struct AArch64Encoder;

impl Encoder for AArch64Encoder {
    fn fill_byte(&self) -> u8 {
        0x00
    }

    fn encode(&self, module: &Module, writer: &mut Writer) -> Result<usize, EncodeError> {
        for word in PROLOGUE {
            writer.write_u32_le(word)?;
        }
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

/// Build the 4-byte instruction word for one IR instruction, per the
/// template table in spec §4.4.2. Returns `None` when `instr.op` has no
/// AArch64 encoding in this version.
fn word_for(instr: &Instruction) -> Option<u32> {
    // Each register field is 5 bits wide; masking keeps an index from
    // bleeding into an adjacent field if it ever exceeds the field width.
    let field5 = mask::<u32>(5);
    let reg_fields = |base: u32, dst: u8, src1: u8, src2: u8| -> u32 {
        base
            | ((dst as u32) & field5)
            | (((src1 as u32) & field5) << 5)
            | (((src2 as u32) & field5) << 16)
    };

    let word = match instr.op {
        Op::AddF32 => reg_fields(0x4E20D400, instr.dst, instr.src1, instr.src2),
        Op::SubF32 => reg_fields(0x4E20D400 ^ 0x40, instr.dst, instr.src1, instr.src2),
        Op::MulF32 => reg_fields(0x6E20DC00, instr.dst, instr.src1, instr.src2),
        Op::DivF32 => reg_fields(0x6E20FC00, instr.dst, instr.src1, instr.src2),
        Op::CmpLtF32 => reg_fields(0x4EA0E400, instr.dst, instr.src1, instr.src2),
        Op::SetZero => reg_fields(0x6E201C00, instr.dst, instr.dst, instr.dst),
        Op::LoadF32 => 0x3DC00000 | ((instr.dst as u32) & field5),
        Op::StoreF32 => 0x3CC00000 | ((instr.dst as u32) & field5),
        _ => return None,
    };
    Some(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::BUFFER_SIZE;
    use crate::ir::Target;

    #[test]
    fn scenario_5_setzero_matches_the_base_xor_self_formula() {
        // dst=3 replicated into the dst/src1/src2 fields of
        // `0x6E201C00 | 3 | (3<<5) | (3<<16)`, by hand: 0x6E231C63. (The
        // worked hex in the scenario text, 0x6E236C63, does not reduce
        // from that formula for any field layout consistent with the
        // rest of the ADD/SUB/MUL/DIV table; the formula is followed
        // here as the unambiguous source of truth — see DESIGN.md.)
        let mut instr = Instruction::new(Op::SetZero);
        instr.dst = 3;
        assert_eq!(word_for(&instr), Some(0x6E231C63));
    }

    #[test]
    fn and_mask_has_no_aarch64_template() {
        let instr = Instruction::new(Op::AndMask);
        assert_eq!(word_for(&instr), None);
    }

    #[test]
    fn full_module_emits_little_endian_words() {
        let mut module = Module::new("t");
        module.target = Target::ArmNeon;
        let mut instr = Instruction::new(Op::SetZero);
        instr.dst = 3;
        module.push(instr);

        let encoder = AArch64Encoder;
        let mut buffer = [0u8; BUFFER_SIZE];
        let mut writer = Writer::new(&mut buffer);
        let skipped = encoder.encode(&module, &mut writer).unwrap();
        assert_eq!(skipped, 0);

        let body_offset = PROLOGUE.len() * 4;
        let word_bytes = &buffer[body_offset..body_offset + 4];
        assert_eq!(word_bytes, &0x6E231C63u32.to_le_bytes());
    }

    #[test]
    fn every_emitted_word_is_four_byte_aligned_in_the_stream() {
        let mut module = Module::new("t");
        for n in 0..4u8 {
            let mut instr = Instruction::new(Op::AddF32);
            instr.dst = n;
            instr.src1 = n;
            instr.src2 = n;
            module.push(instr);
        }
        let encoder = AArch64Encoder;
        let mut buffer = [0u8; BUFFER_SIZE];
        let mut writer = Writer::new(&mut buffer);
        encoder.encode(&module, &mut writer).unwrap();
        assert_eq!(writer.position() % 4, 0);
    }
}
