//! Output format utilities for y86dis.
//!
//! - `asm`: Y86-64 assembly listing with `.pos` markers, data directives, and
//!   byte-accounting comments.

pub mod asm;

pub use asm::{hex_bytes, AsmWriter, Line};
