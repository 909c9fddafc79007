//! Read helpers shared by the record parsers.
//!
//! All multi-byte fields in SG files are little-endian; the parsers use
//! `byteorder` for those and this extension trait for the couple of
//! shapes `byteorder` does not cover.

use std::io::{self, Read};

/// Extension methods for reading fixed-size record fields.
pub(crate) trait ReadRecordExt: Read {
    /// Reads a fixed-size byte array, e.g. a name field.
    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Consumes and discards `count` reserved bytes. Records keep their
    /// unused regions on disk, so the cursor has to move past them.
    fn skip_reserved(&mut self, count: usize) -> io::Result<()> {
        let mut scratch = [0u8; 64];
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(scratch.len());
            self.read_exact(&mut scratch[..n])?;
            remaining -= n;
        }
        Ok(())
    }
}

impl<R: Read> ReadRecordExt for R {}

/// Decodes a NUL-padded 8-bit character field, stopping at the first NUL.
pub(crate) fn field_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    field[..end].iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_array_and_skip() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5, 6]);
        let head: [u8; 2] = cursor.read_array().unwrap();
        assert_eq!(head, [1, 2]);
        cursor.skip_reserved(3).unwrap();
        let tail: [u8; 1] = cursor.read_array().unwrap();
        assert_eq!(tail, [6]);
    }

    #[test]
    fn skip_past_end_is_an_error() {
        let mut cursor = Cursor::new(vec![0u8; 4]);
        assert!(cursor.skip_reserved(5).is_err());
    }

    #[test]
    fn field_string_stops_at_nul() {
        assert_eq!(field_string(b"abc\0def\0"), "abc");
        assert_eq!(field_string(b"abc"), "abc");
        assert_eq!(field_string(b"\0abc"), "");
    }
}
