//! Low-level byte encoding shared by the writer, the reader and the inspector.
//!
//! Counts and table indices use the 7-bit variable-length encoding (low
//! seven bits per byte, high bit set while more bytes follow). Field values
//! use fixed-width little-endian encoding.

use crate::error::{ContentError, Result};
use std::borrow::Cow;

/// Maximum number of bytes a 7-bit encoded `u32` occupies.
pub const MAX_7BIT_LEN: usize = 5;

/// Appends `value` in the 7-bit variable-length encoding.
pub fn write_7bit_encoded(buf: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Appends a 7-bit length prefix followed by the UTF-8 bytes of `s`.
pub fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u32::try_from(s.len())
        .map_err(|_| ContentError::Framing(format!("string of {} bytes is too long", s.len())))?;
    write_7bit_encoded(buf, len);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// A forward-only cursor over container bytes.
///
/// Every read that runs past the end returns a framing error rather than
/// panicking.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: Cow<'a, [u8]>,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `bytes`.
    pub fn new(bytes: Cow<'a, [u8]>) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset from the start of the underlying bytes.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(ContentError::truncated(n, remaining));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.bytes[start..start + n])
    }

    /// Consumes exactly `N` bytes into an array.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Reads a 4-byte little-endian signed integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    /// Reads a 4-byte little-endian unsigned integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Reads a 7-bit variable-length encoded `u32`.
    pub fn read_7bit_encoded(&mut self) -> Result<u32> {
        let mut result: u32 = 0;
        for i in 0..MAX_7BIT_LEN {
            let byte = self.read_u8()?;
            let payload = u32::from(byte & 0x7F);
            if i == MAX_7BIT_LEN - 1 && payload > 0x0F {
                return Err(ContentError::Framing(
                    "7-bit encoded integer overflows 32 bits".into(),
                ));
            }
            result |= payload << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(ContentError::Framing(
            "7-bit encoded integer longer than 5 bytes".into(),
        ))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_7bit_encoded()? as usize;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|e| ContentError::Framing(format!("invalid UTF-8 in string: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn small_values_take_one_byte() {
        let mut buf = Vec::new();
        write_7bit_encoded(&mut buf, 3);
        assert_eq!(buf, [3]);

        buf.clear();
        write_7bit_encoded(&mut buf, 300);
        assert_eq!(buf, [0xAC, 0x02]);
    }

    #[test]
    fn truncated_reads_are_framing_errors() {
        let mut cursor = ByteCursor::new(Cow::Borrowed(&[0x80u8, 0x80]));
        assert!(matches!(
            cursor.read_7bit_encoded(),
            Err(ContentError::Framing(_))
        ));

        let mut cursor = ByteCursor::new(Cow::Borrowed(&[5u8, b'a']));
        assert!(cursor.read_string().is_err());
    }

    #[test]
    fn overlong_encoding_is_rejected() {
        let bytes = [0xFFu8, 0xFF, 0xFF, 0xFF, 0x7F];
        let mut cursor = ByteCursor::new(Cow::Borrowed(&bytes));
        assert!(cursor.read_7bit_encoded().is_err());
    }

    proptest! {
        #[test]
        fn seven_bit_encoding_is_lossless(value in any::<u32>()) {
            let mut buf = Vec::new();
            write_7bit_encoded(&mut buf, value);
            prop_assert!(buf.len() <= MAX_7BIT_LEN);
            let mut cursor = ByteCursor::new(Cow::Owned(buf));
            prop_assert_eq!(cursor.read_7bit_encoded().ok(), Some(value));
            prop_assert_eq!(cursor.remaining(), 0);
        }
    }
}
