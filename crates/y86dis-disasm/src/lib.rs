//! # y86dis-disasm
//!
//! Y86-64 instruction decoding for y86dis.
//!
//! The pipeline reads one opcode byte at a time from a [`ByteSource`],
//! dispatches on its high nibble to one of twelve instruction families,
//! recovers from invalid encodings with `.byte`/`.quad` directives, and
//! writes an assembly listing through [`y86dis_core::AsmWriter`].

pub mod decoder;
pub mod error;
pub mod recovery;
pub mod source;
pub mod stream;
pub mod traits;

pub use decoder::{Decoded, Family, InvalidEncoding, Outcome, Y86Disassembler};
pub use error::{DisasmError, InvalidReason};
pub use recovery::{recover, Directive};
pub use source::{ReaderSource, SliceSource};
pub use stream::{skip_padding, PaddingScan, StreamDriver, Summary};
pub use traits::ByteSource;
