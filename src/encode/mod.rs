//! Component D: per-target byte emitters (spec §4.4). Each backend writes
//! a prologue, one native instruction (or short burst) per IR instruction,
//! then an epilogue, into a fixed 8 KiB buffer. `Writer` replaces the
//! source's "moving cursor into a fixed buffer" pattern (spec §9 design
//! note) with a bounded cursor that reports `EncodeError::Overflow`
//! instead of writing past the end.

pub mod aarch64;
pub mod riscv;
pub mod x86;

use crate::ir::{Module, Target};
use thiserror::Error;

/// The fixed output buffer size (spec §6): always exactly this many bytes,
/// regardless of how much was actually emitted.
pub const BUFFER_SIZE: usize = 8192;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("encoding would write past the end of the {BUFFER_SIZE}-byte output buffer")]
    Overflow,
}

/// What an encoder run produced, beyond the bytes themselves: how many
/// bytes were actually written (before the trailing fill region) and how
/// many IR instructions had no encoding on this target and were skipped.
/// Spec §4.4.4 asks a reimplementation to surface the skip count instead
/// of swallowing it silently, as the source does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeStats {
    pub bytes_written: usize,
    pub skipped_ops: usize,
}

/// A bounded cursor over the fixed-size output buffer.
pub struct Writer<'a> {
    buffer: &'a mut [u8; BUFFER_SIZE],
    position: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buffer: &'a mut [u8; BUFFER_SIZE]) -> Self {
        Writer {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let end = self.position.checked_add(bytes.len()).ok_or(EncodeError::Overflow)?;
        if end > BUFFER_SIZE {
            return Err(EncodeError::Overflow);
        }
        self.buffer[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }

    pub fn write_u32_le(&mut self, word: u32) -> Result<(), EncodeError> {
        self.write_bytes(&word.to_le_bytes())
    }

    /// Fill every byte from the current position to the end of the buffer
    /// with `fill`. Does not advance the cursor — this is the tail region,
    /// not emitted code.
    pub fn fill_tail(&mut self, fill: u8) {
        self.buffer[self.position..].fill(fill);
    }
}

/// A per-target byte emitter.
pub trait Encoder {
    /// The byte value the unused tail of the buffer is filled with before
    /// any code is emitted (spec §4.4.1/§4.4.2: `0x90` on x86, `0x00` on
    /// AArch64/RISC-V).
    fn fill_byte(&self) -> u8;

    /// Emit prologue + body + epilogue into `writer`. Returns the count of
    /// IR instructions skipped for want of an encoding on this target.
    fn encode(&self, module: &Module, writer: &mut Writer) -> Result<usize, EncodeError>;
}

/// Pick the encoder appropriate for `target`. `Target::Unknown` has no
/// encoder — the driver must treat that as fatal before reaching here
/// (spec §4.5).
pub fn encoder_for(target: Target) -> Option<Box<dyn Encoder>> {
    match target {
        Target::X86Sse | Target::X86Avx2 | Target::X86Avx512 => {
            Some(Box::new(x86::X86Encoder { target }))
        }
        Target::ArmNeon | Target::ArmSve => Some(Box::new(aarch64::AArch64Encoder)),
        Target::RiscvRvv => Some(Box::new(riscv::RiscvEncoder)),
        Target::Unknown => None,
    }
}

/// Encode `module` into a freshly allocated, always-8192-byte buffer.
///
/// # Panics
///
/// Panics if `module.target` is `Target::Unknown`. The driver is
/// responsible for treating an unresolved target as a fatal
/// `CompileError` before ever reaching an encoder (spec §4.5).
pub fn encode(module: &Module) -> Result<(Box<[u8; BUFFER_SIZE]>, EncodeStats), EncodeError> {
    let encoder = encoder_for(module.target)
        .expect("encode() called with a module whose target has no encoder");

    let mut buffer = Box::new([0u8; BUFFER_SIZE]);
    let fill = encoder.fill_byte();
    buffer.fill(fill);

    let mut writer = Writer::new(&mut buffer);
    let skipped_ops = encoder.encode(module, &mut writer)?;
    let bytes_written = writer.position();
    writer.fill_tail(fill);

    Ok((
        buffer,
        EncodeStats {
            bytes_written,
            skipped_ops,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_reports_overflow_instead_of_panicking() {
        let mut buffer = [0u8; BUFFER_SIZE];
        let mut writer = Writer::new(&mut buffer);
        let huge = vec![0u8; BUFFER_SIZE + 1];
        assert_eq!(writer.write_bytes(&huge), Err(EncodeError::Overflow));
    }

    #[test]
    fn writer_accepts_exactly_up_to_the_buffer_boundary() {
        let mut buffer = [0u8; BUFFER_SIZE];
        let mut writer = Writer::new(&mut buffer);
        let exact = vec![0xAAu8; BUFFER_SIZE];
        assert!(writer.write_bytes(&exact).is_ok());
        assert_eq!(writer.position(), BUFFER_SIZE);
        assert_eq!(writer.write_bytes(&[0u8]), Err(EncodeError::Overflow));
    }

    #[test]
    fn unknown_target_has_no_encoder() {
        assert!(encoder_for(Target::Unknown).is_none());
    }
}
