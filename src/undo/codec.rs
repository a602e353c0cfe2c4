//! Binary codec: big-endian fixed-width integers, length-prefixed strings,
//! and TLV-style optional fields (spec §4.4, §6.2).
//!
//! Generic over any `Read`/`Write` so tests can drive the codec against an
//! in-memory buffer without touching the filesystem.

use crate::error::{EditorError, ErrorType, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// A single TLV optional field: a one-byte tag plus its raw payload.
pub struct OptField {
    pub tag: u8,
    pub payload: Vec<u8>,
}

pub struct Writer<W: Write> {
    inner: W,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(EditorError::from)
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_u8(v).map_err(EditorError::from)
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.inner.write_u16::<BigEndian>(v).map_err(EditorError::from)
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.inner.write_u32::<BigEndian>(v).map_err(EditorError::from)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.inner.write_u64::<BigEndian>(v).map_err(EditorError::from)
    }

    /// Length-prefixed string: 4-byte unsigned length followed by raw bytes.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_u32(s.len() as u32)?;
        self.write_bytes(s.as_bytes())
    }

    /// TLV optional fields, terminated by a zero-length marker.
    pub fn write_opt_fields(&mut self, fields: &[OptField]) -> Result<()> {
        for field in fields {
            self.write_u8(field.payload.len() as u8)?;
            self.write_u8(field.tag)?;
            self.write_bytes(&field.payload)?;
        }
        self.write_u8(0)
    }
}

pub struct Reader<R: Read> {
    inner: R,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn eof_err() -> EditorError {
        EditorError::new(ErrorType::CorruptFile, "E825", "truncated undo file")
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|_| Self::eof_err())
    }

    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(|_| Self::eof_err())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.inner.read_u16::<BigEndian>().map_err(|_| Self::eof_err())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.inner.read_u32::<BigEndian>().map_err(|_| Self::eof_err())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.inner.read_u64::<BigEndian>().map_err(|_| Self::eof_err())
    }

    /// Returns `None` at a clean EOF (used for the header-loop sentinel,
    /// which also accepts a magic value instead of more headers).
    pub fn try_read_u16(&mut self) -> Result<Option<u16>> {
        let mut buf = [0u8; 2];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(1) => {
                // Short read: finish reading the second byte or fail.
                let second = self.read_u8()?;
                Ok(Some(u16::from_be_bytes([buf[0], second])))
            }
            Ok(_) => Ok(Some(u16::from_be_bytes(buf))),
            Err(e) => Err(EditorError::from(e)),
        }
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        // Guard against a corrupt/adversarial length dragging in gigabytes.
        if len > 64 * 1024 * 1024 {
            return Err(EditorError::corrupt_file("string length", "<unknown>"));
        }
        let bytes = self.read_vec(len)?;
        String::from_utf8(bytes)
            .map_err(|_| EditorError::corrupt_file("invalid utf8", "<unknown>"))
    }

    /// TLV optional fields, terminated by a zero-length marker.
    pub fn read_opt_fields(&mut self) -> Result<Vec<OptField>> {
        let mut fields = Vec::new();
        loop {
            let len = self.read_u8()?;
            if len == 0 {
                break;
            }
            let tag = self.read_u8()?;
            let payload = self.read_vec(len as usize)?;
            fields.push(OptField { tag, payload });
        }
        Ok(fields)
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
