//! Bounds-checked little-endian reads over an in-memory file.

use std::io::{Cursor, ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::error::RawError;

/// Read cursor that fails with [`RawError::PartialRead`] instead of running past
/// the end of its buffer.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    inner: Cursor<&'a [u8]>,
    name: &'a str,
}

impl<'a> ByteCursor<'a> {
    /// Cursor at the start of `buf`; `name` labels errors.
    pub fn new(name: &'a str, buf: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(buf),
            name,
        }
    }

    /// Current offset.
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    /// True for an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes left after the current offset.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    /// Move to an absolute offset, which may equal the buffer length.
    pub fn seek(&mut self, pos: usize) -> Result<(), RawError> {
        if pos > self.len() {
            return Err(self.short(pos, self.len()));
        }
        self.inner.set_position(pos as u64);
        Ok(())
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), RawError> {
        self.seek(self.position() + n)
    }

    /// True when `n` more bytes can be read.
    pub fn has(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    fn short(&self, expected: usize, actual: usize) -> RawError {
        RawError::PartialRead {
            file: self.name.to_string(),
            expected,
            actual,
        }
    }

    fn check<T>(&self, start: usize, need: usize, r: std::io::Result<T>) -> Result<T, RawError> {
        r.map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => self.short(start + need, self.len()),
            _ => RawError::IoError(e),
        })
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, RawError> {
        let start = self.position();
        let r = self.inner.read_u8();
        self.check(start, 1, r)
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, RawError> {
        let start = self.position();
        let r = self.inner.read_u16::<LittleEndian>();
        self.check(start, 2, r)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, RawError> {
        let start = self.position();
        let r = self.inner.read_u32::<LittleEndian>();
        self.check(start, 4, r)
    }

    /// Read a little-endian `f32`.
    pub fn read_f32(&mut self) -> Result<f32, RawError> {
        let start = self.position();
        let r = self.inner.read_f32::<LittleEndian>();
        self.check(start, 4, r)
    }

    /// Borrow the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], RawError> {
        let start = self.position();
        if !self.has(n) {
            return Err(self.short(start + n, self.len()));
        }
        let buf: &'a [u8] = *self.inner.get_ref();
        self.inner.set_position((start + n) as u64);
        Ok(&buf[start..start + n])
    }

    /// Read a NUL-terminated string of at most `max` bytes.
    ///
    /// The terminator is consumed; a string that runs to the end of the buffer
    /// or to `max` is returned as is.
    pub fn read_cstr(&mut self, max: usize) -> Result<String, RawError> {
        let mut out = Vec::new();
        let mut byte = [0u8; 1];
        for _ in 0..max {
            if self.inner.read(&mut byte)? == 0 || byte[0] == 0 {
                break;
            }
            out.push(byte[0]);
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
