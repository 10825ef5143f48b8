//! Assembly listing output.
//!
//! Every line layout here is fixed: the column widths and spacing must match
//! the listings produced by the reference Y86-64 toolchain byte for byte.
//!
//! ```text
//! .pos 0x0
//!     irmovq  $0x5, %rax            # 30F00500000000000000
//!     halt           # 00
//!
//! .pos 0x40
//!     .quad   0x123456f            # 6F45230100000000
//!      .byte   0x6f
//! ```

use std::io::{self, Write};

use crate::{le_value, Instruction};

/// Width of the mnemonic column.
const MNEMONIC_WIDTH: usize = 8;

/// Gap between the operands and the `#` of the byte comment.
const COMMENT_GAP: &str = "            ";

/// Gap used by operand-less instructions (`halt`, `nop`, `ret`).
const BARE_COMMENT_GAP: &str = "       ";

/// Formats bytes as contiguous two-digit uppercase hex pairs.
pub fn hex_bytes(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{:02X}", b);
    }
    s
}

/// One line of the assembly listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `.pos` marker. Markers after the first are preceded by a blank line.
    Pos { address: u64, first: bool },
    /// A decoded instruction.
    Instruction(&'a Instruction),
    /// A single undecodable byte, printed in lowercase hex (`.byte 0x6f`,
    /// never `0x6F`) like the reference toolchain's listings.
    Byte(u8),
    /// An aligned 8-byte span that could not be decoded.
    Quad([u8; 8]),
}

impl std::fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pos { address, first } => {
                if !first {
                    writeln!(f)?;
                }
                write!(f, ".pos {:#x}", address)
            }
            Self::Instruction(insn) => {
                write!(f, "    {:<width$}", insn.mnemonic(), width = MNEMONIC_WIDTH)?;
                if insn.operands.is_empty() {
                    return write!(f, "{}# {}", BARE_COMMENT_GAP, hex_bytes(&insn.bytes));
                }
                for (i, op) in insn.operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", op)?;
                }
                write!(f, "{}# {}", COMMENT_GAP, hex_bytes(&insn.bytes))
            }
            Self::Byte(b) => write!(f, "     {:<width$}{:#04x}", ".byte", b, width = MNEMONIC_WIDTH),
            Self::Quad(bytes) => write!(
                f,
                "    {:<width$}{:#x}{}# {}",
                ".quad",
                le_value(bytes),
                COMMENT_GAP,
                hex_bytes(bytes),
                width = MNEMONIC_WIDTH
            ),
        }
    }
}

/// Line-oriented sink for an assembly listing.
pub struct AsmWriter<W: Write> {
    out: W,
    lines: usize,
}

impl<W: Write> AsmWriter<W> {
    /// Wraps a text sink.
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Writes one listing line followed by a newline.
    pub fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.lines += 1;
        Ok(())
    }

    /// Number of listing lines written so far.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Unwraps the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}
