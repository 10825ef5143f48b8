//! Recovery from invalid encodings.
//!
//! An encoding the decoder rejects is rendered as data instead. At an
//! 8-byte aligned address with a full quad's worth of bytes already fetched
//! it becomes a `.quad` covering all eight; anywhere else it becomes a
//! `.byte` holding only the opcode. Either way the bytes fetched for the
//! encoding stay consumed; decoding resumes after them.

use tracing::debug;
use y86dis_core::Line;

use crate::decoder::{InvalidEncoding, QUAD_SIZE};

/// Data directive chosen for an invalid encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `.byte` holding just the opcode.
    Byte(u8),
    /// `.quad` holding the opcode and the seven bytes after it.
    Quad([u8; QUAD_SIZE]),
}

impl Directive {
    /// Number of input bytes the directive displays.
    pub fn size(&self) -> usize {
        match self {
            Self::Byte(_) => 1,
            Self::Quad(_) => QUAD_SIZE,
        }
    }

    /// Returns the listing line for this directive.
    pub fn line(&self) -> Line<'static> {
        match *self {
            Self::Byte(b) => Line::Byte(b),
            Self::Quad(bytes) => Line::Quad(bytes),
        }
    }
}

/// Chooses the directive for an invalid encoding. Never reads input.
pub fn recover(invalid: &InvalidEncoding) -> Directive {
    let aligned = invalid.address % QUAD_SIZE as u64 == 0;
    let directive = match invalid.quad_bytes() {
        Some(quad) if aligned => Directive::Quad(quad),
        _ => Directive::Byte(invalid.opcode),
    };
    debug!(
        address = invalid.address,
        family = ?invalid.family,
        reason = %invalid.reason,
        "invalid encoding rendered as {}",
        if directive.size() == 1 { ".byte" } else { ".quad" }
    );
    directive
}
