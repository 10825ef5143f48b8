//! Disassembly error types.

use std::io;

use thiserror::Error;

/// Fatal errors that abort a disassembly run.
///
/// Invalid encodings are not errors; they are recovered into data
/// directives. Only I/O failures on the byte source or the text sink end
/// a run early.
#[derive(Error, Debug)]
pub enum DisasmError {
    /// Reading or seeking the byte source failed.
    #[error("I/O error on input at offset {offset:#x}: {source}")]
    Input {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Writing the listing failed.
    #[error("failed to write listing: {0}")]
    Output(#[source] io::Error),
}

impl DisasmError {
    /// Creates a new Input error.
    pub fn input(offset: u64, source: io::Error) -> Self {
        Self::Input { offset, source }
    }
}

/// Why an opcode could not be decoded as an instruction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Sub-code outside the family's legal range.
    #[error("sub-code {0:#x} out of range")]
    BadSubcode(u8),

    /// Register field outside `0x0..=0xE`, or a missing `0xF` sentinel.
    #[error("illegal register fields in operand byte {0:#04x}")]
    BadRegister(u8),

    /// End of stream before the instruction was complete.
    #[error("truncated instruction: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
}

impl InvalidReason {
    /// Creates a new Truncated reason.
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }
}
