//! Big-endian cursor over an immutable byte buffer, and the file loader.
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::ClassFileError;

/// Bounds-checked big-endian reader. Never mutates the underlying buffer and
/// never advances the cursor on a failed read.
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
    len: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(buf), len: buf.len() }
    }

    /// Current cursor offset into the buffer.
    pub fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.len - self.offset()
    }

    fn require(&self, n: usize) -> Result<(), ClassFileError> {
        if self.remaining() < n {
            Err(ClassFileError::UnexpectedEof { offset: self.offset() })
        } else {
            Ok(())
        }
    }

    pub fn read_u1(&mut self) -> Result<u8, ClassFileError> {
        self.require(1)?;
        self.cursor.read_u8().map_err(|_| ClassFileError::UnexpectedEof { offset: self.offset() })
    }

    pub fn read_u2(&mut self) -> Result<u16, ClassFileError> {
        self.require(2)?;
        self.cursor
            .read_u16::<BigEndian>()
            .map_err(|_| ClassFileError::UnexpectedEof { offset: self.offset() })
    }

    pub fn read_u4(&mut self) -> Result<u32, ClassFileError> {
        self.require(4)?;
        self.cursor
            .read_u32::<BigEndian>()
            .map_err(|_| ClassFileError::UnexpectedEof { offset: self.offset() })
    }

    /// Reads `n` bytes and returns an owned copy.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ClassFileError> {
        self.require(n)?;
        let mut buf = vec![0u8; n];
        self.cursor
            .read_exact(&mut buf)
            .map_err(|_| ClassFileError::UnexpectedEof { offset: self.offset() })?;
        Ok(buf)
    }
}

/// Reads a class file from disk into a byte buffer.
pub fn read_class_file(path: &Path) -> std::io::Result<Vec<u8>> {
    fs::read(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_primitives_big_endian() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u4().unwrap(), 0xCAFE_BABE);
        assert_eq!(r.read_u2().unwrap(), 0x0034);
        assert_eq!(r.offset(), 6);
    }

    #[test]
    fn truncated_read_reports_eof_and_does_not_advance() {
        let data = [0x00, 0x01];
        let mut r = ByteReader::new(&data);
        assert!(r.read_u4().is_err());
        assert_eq!(r.offset(), 0);
    }
}
