use clap::Parser;
use env_logger::{Builder, Target};
use log::LevelFilter;
use pvac::driver;
use std::fs;
use std::process::ExitCode;

/// Ahead-of-time compiler for the portable vector assembly (PVA) language
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to a PVA source file
    input: String,

    /// Path to write the 8192-byte output buffer to
    #[arg(short, long)]
    output: String,

    /// Print per-pass optimization findings and encoder stats
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // `log`/`env_logger` carry internal diagnostics only; the progress and
    // failure lines the external interface promises are written directly
    // with `println!`/`eprintln!` below, to stdout and stderr respectively.
    // Diagnostics go to stderr too, filtered by `--verbose`.
    Builder::new()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .target(Target::Stderr)
        .init();

    let source = match fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not open {}: {e}", args.input);
            return ExitCode::FAILURE;
        }
    };

    let output = match driver::compile(&source, &args.input) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::write(&args.output, output.buffer.as_slice()) {
        eprintln!("error: could not write {}: {e}", args.output);
        return ExitCode::FAILURE;
    }

    println!(
        "compiled {} -> {} ({} bytes written, {} fusion candidates, max dependency chain {}, {} ops skipped)",
        args.input,
        args.output,
        output.encode_stats.bytes_written,
        output.optimization.fusion_candidates,
        output.optimization.max_dependency_chain,
        output.encode_stats.skipped_ops,
    );
    log::debug!("optimization report: {:?}", output.optimization);
    log::debug!("encode stats: {:?}", output.encode_stats);

    if args.verbose {
        println!(
            "fusion candidates: {}",
            output.optimization.fusion_candidates
        );
        println!(
            "max dependency chain: {}",
            output.optimization.max_dependency_chain
        );
        println!("bytes written: {}", output.encode_stats.bytes_written);
        println!("ops skipped: {}", output.encode_stats.skipped_ops);
    }

    ExitCode::SUCCESS
}
