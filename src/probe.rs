//! Host capability probe (component A): picks a `Target` and a vector
//! width for the current host. Never fails — an unsupported host degrades
//! to `Target::Unknown` at width 4, and it is the driver's job to treat
//! that as fatal before emission (spec §4.1, §4.5).

use crate::ir::Target;

/// Detect the best `Target` and vector width (in bytes) for the host this
/// process is running on.
///
/// The spec describes this in terms of raw `CPUID` leaves. Reading CPUID
/// directly needs `unsafe`/inline intrinsics; this crate is
/// `#![forbid(unsafe_code)]`, so the check instead goes through the
/// standard library's safe `is_x86_feature_detected!` macro, which queries
/// the same underlying feature bits (SSE2, AVX2, AVX-512F) through the
/// same mechanism the compiler itself uses for `#[target_feature]` gating.
/// The fallback order is unchanged: AVX-512F beats AVX2 beats SSE2 beats
/// unsupported.
pub fn detect() -> (Target, u16) {
    detect_impl()
}

#[cfg(target_arch = "x86_64")]
fn detect_impl() -> (Target, u16) {
    if !std::is_x86_feature_detected!("sse2") {
        return (Target::Unknown, 4);
    }
    if std::is_x86_feature_detected!("avx512f") {
        (Target::X86Avx512, 64)
    } else if std::is_x86_feature_detected!("avx2") {
        (Target::X86Avx2, 32)
    } else {
        (Target::X86Sse, 16)
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_impl() -> (Target, u16) {
    if cfg!(target_feature = "sve") {
        (Target::ArmSve, 16)
    } else {
        (Target::ArmNeon, 16)
    }
}

#[cfg(target_arch = "riscv64")]
fn detect_impl() -> (Target, u16) {
    // Default programmed VL; the actual hardware VL is set at run time by
    // a `vsetvli` the encoder emits as the function's first instruction.
    (Target::RiscvRvv, 32)
}

#[cfg(not(any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "riscv64"
)))]
fn detect_impl() -> (Target, u16) {
    (Target::Unknown, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_never_panics_and_returns_a_consistent_width() {
        let (target, width) = detect();
        match target {
            Target::Unknown => assert_eq!(width, 4),
            Target::X86Sse | Target::ArmNeon | Target::ArmSve => assert_eq!(width, 16),
            Target::X86Avx2 | Target::RiscvRvv => assert_eq!(width, 32),
            Target::X86Avx512 => assert_eq!(width, 64),
        }
    }
}
