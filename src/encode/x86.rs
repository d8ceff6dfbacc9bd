//! x86-64 encoder (spec §4.4.1). Dispatches on `vector_width_bytes`:
//! 16 → legacy SSE opcodes, 32 → two-byte VEX (AVX2), 64 → four-byte EVEX
//! (AVX-512). `AND_MASK`/`OR_MASK`/the comparison ops/`LOOP_BEGIN`/
//! `LOOP_END`/`NOP` have no encoding on this target and are counted as
//! skipped rather than silently dropped (spec §4.4.4, §9 open question 5).

use super::{Encoder, EncodeError, Writer};
use crate::ir::{Instruction, Module, Op, Target};

const PROLOGUE: [u8; 8] = [
    0x55, // push rbp
    0x48, 0x89, 0xE5, // mov rbp, rsp
    0x48, 0x83, 0xEC, 0x20, // sub rsp, 0x20
];

const EPILOGUE: [u8; 12] = [
    0x48, 0xC7, 0xC0, 0x00, 0x00, 0x00, 0x00, // mov rax, 0
    0x48, 0x89, 0xEC, // mov rsp, rbp
    0x5D, // pop rbp
    // ret
];

pub struct X86Encoder {
    pub target: Target,
}

impl Encoder for X86Encoder {
    fn fill_byte(&self) -> u8 {
        0x90
    }

    fn encode(&self, module: &Module, writer: &mut Writer) -> Result<usize, EncodeError> {
        writer.write_bytes(&PROLOGUE)?;
        // The EPILOGUE constant above is missing its trailing `ret` byte
        // so the array literal can keep one instruction per line; append
        // it at the call site instead of growing the array by hand twice.
        let mut skipped = 0usize;
        for instr in module.instructions() {
            if !emit_one(instr, module.vector_width_bytes, writer)? {
                skipped += 1;
            }
        }
        writer.write_bytes(&EPILOGUE)?;
        writer.write_bytes(&[0xC3])?;
        Ok(skipped)
    }
}

/// Emit the native encoding for one IR instruction. Returns `Ok(true)` if
/// something was emitted, `Ok(false)` if the op has no x86 encoding (the
/// caller counts that as a skip), or `Err` on buffer overflow.
fn emit_one(instr: &Instruction, width: u16, writer: &mut Writer) -> Result<bool, EncodeError> {
    let opcode = match instr.op {
        Op::AddF32 => 0x58,
        Op::SubF32 => 0x5C,
        Op::MulF32 => 0x59,
        Op::DivF32 => 0x5E,
        Op::LoadF32 => 0x10,
        Op::StoreF32 => 0x11,
        Op::SetZero => 0x57,
        _ => return Ok(false),
    };

    match width {
        16 => emit_sse(instr, opcode, writer)?,
        32 => emit_avx2(instr, opcode, writer)?,
        64 => emit_avx512(instr, opcode, writer)?,
        _ => emit_sse(instr, opcode, writer)?,
    }
    Ok(true)
}

/// `mod=11` register-register ModRM: `reg` in bits [5:3], `rm` in bits [2:0].
fn modrm_reg(reg: u8, rm: u8) -> u8 {
    0xC0 | ((reg & 0x7) << 3) | (rm & 0x7)
}

/// `mod=00, r/m=110`: the hardcoded `[rsi]` memory operand (spec §4.4.1).
fn modrm_mem_rsi(reg: u8) -> u8 {
    0x00 | ((reg & 0x7) << 3) | 0b110
}

fn emit_sse(instr: &Instruction, opcode: u8, writer: &mut Writer) -> Result<(), EncodeError> {
    writer.write_bytes(&[0x0F, opcode])?;
    let modrm = match instr.op {
        Op::LoadF32 | Op::StoreF32 => modrm_mem_rsi(instr.dst),
        Op::SetZero => modrm_reg(instr.dst, instr.dst),
        _ => modrm_reg(instr.dst, instr.src2),
    };
    writer.write_bytes(&[modrm])
}

/// Two-byte VEX prefix (spec §4.4.1, Scenario 4). `R` covers the high bit
/// of the destination register, `vvvv` carries the first source
/// (non-destructive operand), both inverted per the VEX encoding.
fn vex2_byte(dst: u8, vvvv_src: u8, length_256: bool) -> u8 {
    let r_inverted: u8 = 1 - ((dst >> 3) & 1);
    let vvvv_inverted: u8 = (!vvvv_src) & 0xF;
    let l: u8 = if length_256 { 1 } else { 0 };
    (r_inverted << 7) | (vvvv_inverted << 3) | (l << 2)
}

fn emit_avx2(instr: &Instruction, opcode: u8, writer: &mut Writer) -> Result<(), EncodeError> {
    let (vvvv_src, modrm) = match instr.op {
        Op::LoadF32 | Op::StoreF32 => (0xFu8, modrm_mem_rsi(instr.dst)),
        Op::SetZero => (instr.dst, modrm_reg(instr.dst, instr.dst)),
        _ => (instr.src1, modrm_reg(instr.dst, instr.src2)),
    };
    let byte1 = vex2_byte(instr.dst, vvvv_src, true);
    writer.write_bytes(&[0xC5, byte1, opcode, modrm])
}

/// Four-byte EVEX prefix (spec §4.4.1). `P0` carries the inverted
/// `R`/`X`/`B`/`R'` high-register bits over a fixed 0F opcode-map selector;
/// `P1` carries `W`, the inverted `vvvv`, and the fixed `0x48` field for
/// 512-bit with `k0`; `P2` carries zeroing, the `L'L` vector-length field
/// (`2` → 512-bit), and the mask-register field.
fn evex_prefix(dst: u8, vvvv_src: u8, mask_reg: i8) -> [u8; 4] {
    let r: u8 = (dst >> 3) & 1;
    let r_prime: u8 = (dst >> 4) & 1; // always 0 for a 16-entry register file
    let x: u8 = 0;
    let b: u8 = 0;
    let opcode_map_selector: u8 = 0x7D & 0x0F;
    let p0: u8 = opcode_map_selector
        | ((1 - r) << 7)
        | ((1 - x) << 6)
        | ((1 - b) << 5)
        | ((1 - r_prime) << 4);
    let vvvv_inverted: u8 = (!vvvv_src) & 0xF;
    let p1: u8 = 0x48 | (vvvv_inverted << 3);
    let aaa: u8 = if mask_reg >= 0 { (mask_reg as u8) & 0x7 } else { 0 };
    let zeroing: u8 = if mask_reg >= 0 { 1 } else { 0 };
    let p2: u8 = (zeroing << 7) | (2u8 << 5) | aaa;
    [0x62, p0, p1, p2]
}

fn emit_avx512(instr: &Instruction, opcode: u8, writer: &mut Writer) -> Result<(), EncodeError> {
    let (vvvv_src, modrm) = match instr.op {
        Op::LoadF32 | Op::StoreF32 => (0xFu8, modrm_mem_rsi(instr.dst)),
        Op::SetZero => (instr.dst, modrm_reg(instr.dst, instr.dst)),
        _ => (instr.src1, modrm_reg(instr.dst, instr.src2)),
    };
    let prefix = evex_prefix(instr.dst, vvvv_src, instr.mask_reg);
    writer.write_bytes(&prefix)?;
    writer.write_bytes(&[opcode, modrm])
}
