//! y86dis - Y86-64 object code disassembler
//!
//! Usage:
//!   y86dis <input>                    Disassemble to standard output
//!   y86dis <input> <output>           Write the listing to a file
//!   y86dis <input> <output> <offset>  Start decoding at a byte offset

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use y86dis_core::AsmWriter;
use y86dis_disasm::{ReaderSource, StreamDriver};

#[derive(Parser)]
#[command(name = "y86dis")]
#[command(about = "A Y86-64 object code disassembler", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the object code file
    input: PathBuf,

    /// Path to write the listing to (default: standard output)
    output: Option<PathBuf>,

    /// Byte offset to start decoding at (decimal, 0x hex, or 0-prefixed octal)
    #[arg(value_parser = parse_offset)]
    offset: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Parses an offset the way C's `strtol(s, NULL, 0)` picks a radix.
fn parse_offset(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    u64::from_str_radix(digits, radix).map_err(|e| format!("invalid offset '{}': {}", s, e))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "y86dis=info",
        1 => "y86dis=debug,y86dis_disasm=debug",
        _ => "y86dis=trace,y86dis_disasm=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let input = File::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let start = cli.offset.unwrap_or(0);
    info!("Opened {}, starting offset {:#X}", cli.input.display(), start);

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };
    info!(
        "Saving output to {}",
        cli.output
            .as_ref()
            .map_or_else(|| "standard output".to_string(), |p| p.display().to_string())
    );

    let source = ReaderSource::new(input).context("Failed to read input")?;
    let mut out = AsmWriter::new(sink);
    let summary = StreamDriver::new(source)
        .with_start(start)
        .run(&mut out)
        .with_context(|| format!("Failed to disassemble {}", cli.input.display()))?;

    info!(
        instructions = summary.instructions,
        quads = summary.quads,
        bytes = summary.bytes,
        skipped = summary.skipped,
        "disassembled {:#x}..{:#x}",
        start,
        summary.end_address
    );

    Ok(())
}
