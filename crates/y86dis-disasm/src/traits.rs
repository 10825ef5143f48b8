//! Byte source trait consumed by the decoder.

use std::io;

/// Sequential, seekable provider of input bytes.
///
/// Addresses reported by the decoder are the source's positions, so
/// `position` must equal the offset of the next byte `read_byte` returns.
pub trait ByteSource {
    /// Moves the read position to `offset`. Seeking past the end is allowed;
    /// subsequent reads report end of stream.
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Reads one byte, or `None` at end of stream.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Offset of the next byte to be read.
    fn position(&self) -> u64;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek(offset)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }
}
