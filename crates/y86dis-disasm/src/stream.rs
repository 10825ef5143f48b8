//! Listing driver: padding scan, decode, recover, emit.
//!
//! Zero bytes at the start of the stream and after every `halt` are treated
//! as padding. Where real content resumes after padding a `.pos` marker is
//! emitted; the listing always opens with one. A zero byte met anywhere else
//! decodes as `halt`.

use std::io::Write;

use tracing::{debug, trace};
use y86dis_core::{AsmWriter, Line};

use crate::decoder::{Outcome, Y86Disassembler};
use crate::recovery::{recover, Directive};
use crate::{ByteSource, DisasmError};

/// Where a padding scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingScan {
    /// Address of `current`.
    pub address: u64,
    /// First nonzero byte, or `None` at end of stream.
    pub current: Option<u8>,
    /// Number of zero bytes skipped.
    pub skipped: u64,
    /// Position marker to emit, if padding was skipped and content follows.
    pub marker: Option<Line<'static>>,
}

/// Skips a run of zero bytes starting with `current` at `address`.
///
/// If `current` is already nonzero nothing is skipped and no marker is
/// produced. `first` selects the formatting of the marker: the first marker
/// of a listing has no blank line before it.
pub fn skip_padding<S: ByteSource + ?Sized>(
    source: &mut S,
    mut address: u64,
    mut current: Option<u8>,
    first: bool,
) -> Result<PaddingScan, DisasmError> {
    let mut skipped = 0;
    while current == Some(0) {
        address = source.position();
        current = read(source)?;
        skipped += 1;
    }

    let marker = match current {
        Some(_) if skipped > 0 => Some(Line::Pos { address, first }),
        _ => None,
    };
    if skipped > 0 {
        trace!(skipped, resume = address, "skipped padding");
    }

    Ok(PaddingScan {
        address,
        current,
        skipped,
        marker,
    })
}

fn read<S: ByteSource + ?Sized>(source: &mut S) -> Result<Option<u8>, DisasmError> {
    let offset = source.position();
    source
        .read_byte()
        .map_err(|e| DisasmError::input(offset, e))
}

/// Counts of what a run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Instructions decoded.
    pub instructions: usize,
    /// `.quad` directives emitted.
    pub quads: usize,
    /// `.byte` directives emitted.
    pub bytes: usize,
    /// Opcodes with no assigned family.
    pub skipped: usize,
    /// Zero bytes treated as padding.
    pub padding: u64,
    /// Address just past the last byte read.
    pub end_address: u64,
}

/// Drives a byte source through the decoder into an assembly listing.
pub struct StreamDriver<S: ByteSource> {
    source: S,
    disasm: Y86Disassembler,
    start: u64,
}

impl<S: ByteSource> StreamDriver<S> {
    /// Creates a driver that starts decoding at offset 0.
    pub fn new(source: S) -> Self {
        Self {
            source,
            disasm: Y86Disassembler::new(),
            start: 0,
        }
    }

    /// Sets the offset of the first byte to decode.
    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Unwraps the byte source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Decodes the whole stream from the start offset, writing the listing to `out`.
    pub fn run<W: Write>(&mut self, out: &mut AsmWriter<W>) -> Result<Summary, DisasmError> {
        let mut summary = Summary::default();

        self.source
            .seek(self.start)
            .map_err(|e| DisasmError::input(self.start, e))?;
        let mut address = self.source.position();
        let mut current = read(&mut self.source)?;

        match current {
            Some(0) => {
                let scan = skip_padding(&mut self.source, address, current, true)?;
                (address, current) = self.after_padding(scan, out, &mut summary)?;
            }
            Some(_) => emit(out, &Line::Pos { address, first: true })?,
            None => {}
        }

        while let Some(opcode) = current {
            let decoded = self.disasm.decode(opcode, &mut self.source, address)?;
            let mut halted = false;

            match &decoded.outcome {
                Outcome::Instruction(insn) => {
                    emit(out, &Line::Instruction(insn))?;
                    summary.instructions += 1;
                    halted = insn.is_halt();
                }
                Outcome::Invalid(invalid) => {
                    let directive = recover(invalid);
                    emit(out, &directive.line())?;
                    match directive {
                        Directive::Byte(_) => summary.bytes += 1,
                        Directive::Quad(_) => summary.quads += 1,
                    }
                }
                Outcome::Skipped => {
                    debug!(address, opcode, "no instruction family for opcode");
                    summary.skipped += 1;
                }
            }

            // Bytes fetched for a rejected encoding stay consumed.
            address += decoded.size as u64;
            current = read(&mut self.source)?;

            if halted {
                let scan = skip_padding(&mut self.source, address, current, false)?;
                (address, current) = self.after_padding(scan, out, &mut summary)?;
            }
        }

        summary.end_address = self.source.position();
        out.flush().map_err(DisasmError::Output)?;
        Ok(summary)
    }

    fn after_padding<W: Write>(
        &self,
        scan: PaddingScan,
        out: &mut AsmWriter<W>,
        summary: &mut Summary,
    ) -> Result<(u64, Option<u8>), DisasmError> {
        summary.padding += scan.skipped;
        if let Some(marker) = &scan.marker {
            emit(out, marker)?;
        }
        Ok((scan.address, scan.current))
    }
}

fn emit<W: Write>(out: &mut AsmWriter<W>, line: &Line<'_>) -> Result<(), DisasmError> {
    out.write_line(line).map_err(DisasmError::Output)
}
