//! Byte cursor and variable-length quantity (VLQ) helpers
//!
//! SMF stores delta times and chunk-local lengths as big-endian VLQs: seven
//! payload bits per byte, with the high bit set on every byte but the last.
//! A quantity is at most four bytes long, so the largest value is 0x0FFF_FFFF.

use crate::error::{Error, Result};

/// Largest value a four byte VLQ can hold.
pub const MAX_VAR_LEN: u32 = 0x0FFF_FFFF;

const MAX_VAR_LEN_BYTES: usize = 4;

/// Forward-only reader over a borrowed byte buffer.
///
/// Offsets reported in errors are `base + position`, so a cursor over a track
/// payload can still point at the right place in the whole file.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Cursor whose reported offsets start at `base`.
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Position within the wrapped buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Position as an offset into the enclosing file.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self
            .peek_u8()
            .ok_or_else(|| Error::truncated(self.offset(), "1 byte"))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::truncated(self.offset(), format!("{} bytes", len)));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read one variable-length quantity.
    ///
    /// Fails with [`Error::TruncatedInput`] if the buffer ends mid-sequence or
    /// the fourth byte still carries a continuation bit.
    pub fn read_var_len(&mut self) -> Result<u32> {
        let start = self.offset();
        let mut value: u32 = 0;

        for _ in 0..MAX_VAR_LEN_BYTES {
            let byte = self
                .read_u8()
                .map_err(|_| Error::truncated(start, "end of variable-length quantity"))?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(Error::truncated(
            start,
            "variable-length quantity of at most 4 bytes",
        ))
    }
}

/// Append `value` as a variable-length quantity.
pub fn write_var_len(buf: &mut Vec<u8>, value: u32) -> Result<()> {
    if value > MAX_VAR_LEN {
        return Err(Error::ValueTooLarge {
            value: u64::from(value),
        });
    }

    let mut bytes = [0u8; MAX_VAR_LEN_BYTES];
    let mut i = MAX_VAR_LEN_BYTES - 1;
    let mut rest = value;
    bytes[i] = (rest & 0x7F) as u8;
    rest >>= 7;
    while rest > 0 {
        i -= 1;
        bytes[i] = ((rest & 0x7F) as u8) | 0x80;
        rest >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
    Ok(())
}

/// Number of bytes `value` takes as a variable-length quantity.
pub fn var_len_size(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode(bytes: &[u8]) -> Result<u32> {
        ByteCursor::new(bytes).read_var_len()
    }

    #[test]
    fn test_known_var_len_values() {
        assert_eq!(decode(&[0x00]).unwrap(), 0);
        assert_eq!(decode(&[0x40]).unwrap(), 0x40);
        assert_eq!(decode(&[0x7F]).unwrap(), 0x7F);
        assert_eq!(decode(&[0x81, 0x00]).unwrap(), 0x80);
        assert_eq!(decode(&[0xC0, 0x00]).unwrap(), 0x2000);
        assert_eq!(decode(&[0xFF, 0x7F]).unwrap(), 0x3FFF);
        assert_eq!(decode(&[0x81, 0x80, 0x00]).unwrap(), 0x4000);
        assert_eq!(decode(&[0xFF, 0xFF, 0xFF, 0x7F]).unwrap(), MAX_VAR_LEN);
    }

    #[test]
    fn test_var_len_advances_cursor() {
        let mut cursor = ByteCursor::new(&[0x81, 0x00, 0x05]);
        assert_eq!(cursor.read_var_len().unwrap(), 0x80);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_var_len().unwrap(), 5);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_var_len_truncated_mid_sequence() {
        let err = decode(&[0x81, 0x80]).unwrap_err();
        assert!(matches!(err, Error::TruncatedInput { offset: 0, .. }));
        assert!(matches!(decode(&[]), Err(Error::TruncatedInput { .. })));
    }

    #[test]
    fn test_var_len_too_many_continuation_bytes() {
        let err = decode(&[0x80, 0x80, 0x80, 0x80, 0x00]).unwrap_err();
        assert!(matches!(err, Error::TruncatedInput { .. }));
    }

    #[test]
    fn test_write_var_len_rejects_large_values() {
        let mut buf = Vec::new();
        let err = write_var_len(&mut buf, MAX_VAR_LEN + 1).unwrap_err();
        assert!(matches!(err, Error::ValueTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fixed_reads_report_file_offset() {
        let mut cursor = ByteCursor::with_base(&[0x01, 0x02, 0x03], 100);
        assert_eq!(cursor.read_u16_be().unwrap(), 0x0102);
        match cursor.read_u32_be() {
            Err(Error::TruncatedInput { offset, .. }) => assert_eq!(offset, 102),
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn var_len_round_trips(value in 0u32..=MAX_VAR_LEN) {
            let mut buf = Vec::new();
            write_var_len(&mut buf, value).unwrap();
            prop_assert_eq!(buf.len(), var_len_size(value));
            let mut cursor = ByteCursor::new(&buf);
            prop_assert_eq!(cursor.read_var_len().unwrap(), value);
            prop_assert!(cursor.is_at_end());
        }
    }
}
