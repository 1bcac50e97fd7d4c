//! The primitive stream reader.
//!
//! Everything else in this crate is built out of five primitive reads: fixed
//! little-endian integers and floats, a LEB128-style variable length
//! unsigned integer (with a 30-bit-clamped variant), and a length-prefixed
//! UTF-8 string. A short read anywhere is reported as [`Error::AbcCorrupt`]
//! rather than propagated as a raw I/O error, since to a caller parsing a
//! byte array there's no meaningful difference between "the file is
//! truncated" and "the reader hit EOF".

use crate::error::Error;
use crate::intern;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use std::sync::Arc;

bitflags::bitflags! {
    /// Parser behavior flags. The only one that exists today controls how
    /// invalid UTF-8 in a string constant is handled.
    #[derive(Default)]
    pub struct ParseOptions: u8 {
        /// Replace invalid UTF-8 byte sequences with U+FFFD instead of
        /// failing the parse with [`Error::AbcInvalidUtf8`].
        const LENIENT_UTF8 = 0b0000_0001;
    }
}

/// Reads the primitive encodings that make up an ABC file from an arbitrary
/// [`Read`] source. Does not close or otherwise take ownership of the
/// underlying source beyond this struct's lifetime.
pub struct Reader<R: Read> {
    inner: R,
    options: ParseOptions,
    position: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R, options: ParseOptions) -> Self {
        Reader {
            inner,
            options,
            position: 0,
        }
    }

    /// Byte offset into the stream the reader has consumed so far. Used only
    /// for error messages; the format itself has no length-prefixed framing
    /// that depends on absolute position.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn map_io_err(&self, e: std::io::Error) -> Error {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::AbcCorrupt
        } else {
            Error::Io(e)
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let v = self.inner.read_u8().map_err(|e| self.map_io_err(e))?;
        self.position += 1;
        Ok(v)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, Error> {
        let v = self
            .inner
            .read_u16::<LittleEndian>()
            .map_err(|e| self.map_io_err(e))?;
        self.position += 2;
        Ok(v)
    }

    pub fn read_d64_le(&mut self) -> Result<f64, Error> {
        let v = self
            .inner
            .read_f64::<LittleEndian>()
            .map_err(|e| self.map_io_err(e))?;
        self.position += 8;
        Ok(v)
    }

    /// Variable-length unsigned 32-bit integer: up to 5 bytes, 7 low bits
    /// per byte, little-endian, continuation in the high bit. The loop bound
    /// is fixed at 5 iterations regardless of whether the fifth byte's high
    /// bit is set — any bits beyond what a 5-byte LEB128 sequence can carry
    /// are simply never read.
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let mut result: u32 = 0;
        for i in 0..5 {
            let byte = self.read_u8()?;
            if i < 4 {
                result |= u32::from(byte & 0x7f) << (7 * i);
            } else {
                // Fifth byte: only its low 4 bits contribute (bits 28..31 of
                // the result); any higher bits it might carry are discarded.
                result |= u32::from(byte & 0x0f) << 28;
            }
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(result)
    }

    /// As [`Reader::read_u32`], but rejects values with bit 30 or 31 set.
    pub fn read_u30(&mut self) -> Result<u32, Error> {
        let value = self.read_u32()?;
        if value & 0xc000_0000 != 0 {
            return Err(Error::AbcIllegalU30 { value });
        }
        Ok(value)
    }

    /// U30-length-prefixed UTF-8 string. Strings of 30 bytes or fewer (after
    /// decoding; ABC files only ever emit ASCII-range short identifiers so
    /// this is effectively "30 bytes") are canonicalized through the
    /// process-wide intern table.
    pub fn read_string(&mut self) -> Result<Arc<str>, Error> {
        let len = self.read_u30()?;
        if len == 0 {
            return Ok(intern::intern(""));
        }
        let offset = self.position();
        let mut bytes = vec![0u8; len as usize];
        self.inner
            .read_exact(&mut bytes)
            .map_err(|e| self.map_io_err(e))?;
        self.position += u64::from(len);

        let decoded = if self.options.contains(ParseOptions::LENIENT_UTF8) {
            let (cow, _had_errors) = encoding_rs::UTF_8.decode_without_bom_handling(&bytes);
            cow.into_owned()
        } else {
            match std::str::from_utf8(&bytes) {
                Ok(s) => s.to_owned(),
                Err(_) => return Err(Error::AbcInvalidUtf8 { offset }),
            }
        };
        Ok(intern::intern(&decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: &[u8]) -> Reader<&[u8]> {
        Reader::new(bytes, ParseOptions::default())
    }

    #[test]
    fn reads_u8_and_u16_le() {
        let mut r = reader(&[0x12, 0x34, 0x56]);
        assert_eq!(r.read_u8().unwrap(), 0x12);
        assert_eq!(r.read_u16_le().unwrap(), 0x5634);
    }

    #[test]
    fn reads_single_byte_u32() {
        let mut r = reader(&[0x01]);
        assert_eq!(r.read_u32().unwrap(), 1);
    }

    #[test]
    fn reads_multi_byte_u32() {
        // 0xFFFFFFFF encoded as a 5-byte LEB128 u32.
        let mut r = reader(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(r.read_u32().unwrap(), 0xFFFFFFFF);
    }

    #[test]
    fn read_u30_rejects_top_bits() {
        let mut r = reader(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        let err = r.read_u30().unwrap_err();
        assert!(matches!(err, Error::AbcIllegalU30 { value: 0xFFFFFFFF }));
    }

    #[test]
    fn read_u30_accepts_max_30_bit_value() {
        let mut r = reader(&[0xFF, 0xFF, 0xFF, 0xFF, 0x03]);
        assert_eq!(r.read_u30().unwrap(), 0x3FFFFFFF);
    }

    #[test]
    fn short_read_is_abc_corrupt() {
        let mut r = reader(&[0x01]);
        assert!(matches!(r.read_u16_le().unwrap_err(), Error::AbcCorrupt));
    }

    #[test]
    fn reads_empty_string_without_consuming_bytes() {
        let mut r = reader(&[0x00]);
        let s = r.read_string().unwrap();
        assert_eq!(&*s, "");
    }

    #[test]
    fn reads_short_string_and_interns_it() {
        let mut r = reader(&[0x03, b'a', b'b', b'c']);
        let s = r.read_string().unwrap();
        assert_eq!(&*s, "abc");
    }

    #[test]
    fn strict_mode_rejects_invalid_utf8() {
        let mut r = reader(&[0x01, 0xFF]);
        assert!(matches!(
            r.read_string().unwrap_err(),
            Error::AbcInvalidUtf8 { .. }
        ));
    }

    #[test]
    fn lenient_mode_replaces_invalid_utf8() {
        let mut r = Reader::new([0x01u8, 0xFF].as_slice(), ParseOptions::LENIENT_UTF8);
        let s = r.read_string().unwrap();
        assert_eq!(&*s, "\u{FFFD}");
    }
}
