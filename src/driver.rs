//! Component E: the compile driver. Sequences parse → probe → optimize →
//! select encoder → emit (spec §4.5), owning the module exclusively at
//! each stage (spec §5) and turning every stage's failure into one
//! `CompileError`.

use crate::encode::{self, EncodeError, EncodeStats, BUFFER_SIZE};
use crate::optimizer::{self, OptimizationReport};
use crate::parser::{self, ParseError};
use crate::probe;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0} parse error(s); first is {first}")]
    Parse { count: usize, first: ParseError },
    #[error("host capability probe returned an unsupported target")]
    UnsupportedTarget,
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
}

/// Everything a successful compile produces: the fixed-size output
/// buffer plus the two report-only byproducts of the pipeline (spec
/// §4.3 pass 3 and pass 5, and the encoder's skip count).
pub struct CompileOutput {
    pub buffer: Box<[u8; BUFFER_SIZE]>,
    pub optimization: OptimizationReport,
    pub encode_stats: EncodeStats,
}

/// Run the full pipeline over `source` and produce a finished output
/// buffer. A parse error aborts the compile immediately (spec §7: parse
/// errors are accumulated internally by the parser, but any error count
/// above zero means no usable module reaches the optimizer here — the
/// CLI surfaces the full list before calling this).
pub fn compile(source: &str, source_name: &str) -> Result<CompileOutput, CompileError> {
    let outcome = parser::parse_module(source, source_name);
    if let Some(first) = outcome.errors.into_iter().next() {
        return Err(CompileError::Parse {
            count: outcome.error_count(),
            first,
        });
    }

    let mut module = outcome.module;
    let (target, vector_width_bytes) = probe::detect();
    if target == crate::ir::Target::Unknown {
        return Err(CompileError::UnsupportedTarget);
    }
    module.target = target;
    module.vector_width_bytes = vector_width_bytes;

    let optimization = optimizer::run_pipeline(&mut module);
    let (buffer, encode_stats) = encode::encode(&module)?;

    Ok(CompileOutput {
        buffer,
        optimization,
        encode_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_1_end_to_end_keeps_two_instructions_and_emits_a_full_buffer() {
        let source = "\
vadd r0, r1, r2
vstore r0, [base]
vmul r5, r6, r7   # dead
";
        let output = compile(source, "scenario1").unwrap();
        assert_eq!(output.buffer.len(), BUFFER_SIZE);
    }

    #[test]
    fn a_parse_error_aborts_before_optimization_or_emission() {
        let source = "vfoo r0, r1, r2\n";
        let err = compile(source, "bad").unwrap_err();
        assert!(matches!(err, CompileError::Parse { count: 1, .. }));
    }

    #[test]
    fn empty_source_still_produces_a_full_size_buffer() {
        let output = compile("", "empty").unwrap();
        assert_eq!(output.buffer.len(), BUFFER_SIZE);
        assert_eq!(output.optimization.max_dependency_chain, 0);
    }

    #[test]
    fn compiled_output_round_trips_through_a_file_unchanged() {
        let source = "vzero r0\nvstore r0, [base]\n";
        let output = compile(source, "roundtrip").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, output.buffer.as_slice()).unwrap();

        let read_back = std::fs::read(&path).unwrap();
        assert_eq!(read_back.len(), BUFFER_SIZE);
        assert_eq!(read_back.as_slice(), output.buffer.as_slice());
    }
}
