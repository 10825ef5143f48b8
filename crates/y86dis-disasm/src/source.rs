//! Byte source implementations.

use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};

use crate::ByteSource;

/// Byte source over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: u64,
}

impl<'a> SliceSource<'a> {
    /// Creates a source positioned at offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the bytes not yet read.
    pub fn remaining(&self) -> &'a [u8] {
        usize::try_from(self.pos)
            .ok()
            .and_then(|pos| self.data.get(pos..))
            .unwrap_or_default()
    }
}

impl ByteSource for SliceSource<'_> {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.pos = offset;
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.remaining().first().copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

/// Byte source over any seekable reader, buffered.
pub struct ReaderSource<R: Read + Seek> {
    inner: BufReader<R>,
    pos: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    /// Wraps a reader, taking its current stream position as the start.
    pub fn new(mut reader: R) -> io::Result<Self> {
        let pos = reader.stream_position()?;
        Ok(Self {
            inner: BufReader::new(reader),
            pos,
        })
    }

    /// Unwraps the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.pos = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.pos += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_slice_source_reads_and_seeks() {
        let mut src = SliceSource::new(&[0x10, 0x20, 0x30]);
        assert_eq!(src.read_byte().unwrap(), Some(0x10));
        assert_eq!(src.position(), 1);
        src.seek(2).unwrap();
        assert_eq!(src.read_byte().unwrap(), Some(0x30));
        assert_eq!(src.read_byte().unwrap(), None);
        assert_eq!(src.position(), 3);
    }

    #[test]
    fn test_slice_source_seek_past_end() {
        let mut src = SliceSource::new(&[0x10]);
        src.seek(100).unwrap();
        assert_eq!(src.read_byte().unwrap(), None);
        assert_eq!(src.position(), 100);
        assert!(src.remaining().is_empty());
    }

    #[test]
    fn test_reader_source_matches_slice_source() {
        let data = [0x30, 0xF0, 0x05, 0x00, 0x90];
        let mut reader = ReaderSource::new(Cursor::new(data.to_vec())).unwrap();
        let mut slice = SliceSource::new(&data);
        reader.seek(1).unwrap();
        slice.seek(1).unwrap();
        loop {
            assert_eq!(reader.position(), slice.position());
            let (a, b) = (reader.read_byte().unwrap(), slice.read_byte().unwrap());
            assert_eq!(a, b);
            if a.is_none() {
                break;
            }
        }
    }

    #[test]
    fn test_reader_source_starts_at_stream_position() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3]);
        cursor.set_position(2);
        let mut src = ReaderSource::new(cursor).unwrap();
        assert_eq!(src.position(), 2);
        assert_eq!(src.read_byte().unwrap(), Some(3));
    }
}
