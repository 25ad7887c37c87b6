//! Positioned byte source with explicit-endianness scalar reads.
//!
//! Two byte orders are live during any decode: the fat wrapper is always
//! big-endian while thin slices may be either. Every multi-byte read
//! therefore takes the order explicitly rather than baking it into the
//! reader.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// Byte order for scalar reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

/// Bounds-checked reader over an in-memory byte source.
///
/// Seeks may position past the end (mirroring a file cursor); the following
/// read fails with [`DecodeError::Truncated`] carrying the position, the
/// requested length, and what was actually available.
pub struct SourceReader<'a> {
    data: &'a [u8],
    pos: u64,
}

impl<'a> SourceReader<'a> {
    /// Wrap a byte source, positioned at offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total length of the source in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the source is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current position.
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Seek to an absolute position.
    pub fn seek_abs(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Seek relative to the current position.
    pub fn seek_rel(&mut self, delta: i64) -> Result<()> {
        let target = self.pos.checked_add_signed(delta).ok_or(DecodeError::Truncated {
            position: self.pos,
            requested: delta.unsigned_abs() as usize,
            available: self.pos,
        })?;
        self.pos = target;
        Ok(())
    }

    /// Read exactly `n` bytes, advancing the position.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.len().saturating_sub(self.pos);
        if (n as u64) > available {
            return Err(DecodeError::Truncated {
                position: self.pos,
                requested: n,
                available,
            });
        }
        let start = self.pos as usize;
        self.pos += n as u64;
        Ok(&self.data[start..start + n])
    }

    /// Read a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read an unsigned 16-bit scalar in the given byte order.
    pub fn read_u16(&mut self, order: ByteOrder) -> Result<u16> {
        let bytes = self.read_array::<2>()?;
        Ok(match order {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    /// Read a signed 16-bit scalar in the given byte order.
    pub fn read_i16(&mut self, order: ByteOrder) -> Result<i16> {
        Ok(self.read_u16(order)? as i16)
    }

    /// Read an unsigned 32-bit scalar in the given byte order.
    pub fn read_u32(&mut self, order: ByteOrder) -> Result<u32> {
        let bytes = self.read_array::<4>()?;
        Ok(match order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Read an unsigned 64-bit scalar in the given byte order.
    pub fn read_u64(&mut self, order: ByteOrder) -> Result<u64> {
        let bytes = self.read_array::<8>()?;
        Ok(match order {
            ByteOrder::Little => u64::from_le_bytes(bytes),
            ByteOrder::Big => u64::from_be_bytes(bytes),
        })
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }
}

/// Decode a fixed-width name field: the prefix before the first NUL,
/// UTF-8 with replacement on invalid sequences. Never fails.
pub fn name_from_bytes(raw: &[u8]) -> String {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..len]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_scalars_both_orders() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut r = SourceReader::new(&data);
        assert_eq!(r.read_u32(ByteOrder::Little).unwrap(), 0x04030201);
        r.seek_abs(0);
        assert_eq!(r.read_u32(ByteOrder::Big).unwrap(), 0x01020304);
        assert_eq!(r.read_u16(ByteOrder::Little).unwrap(), 0x0605);
        assert_eq!(r.tell(), 6);
    }

    #[test]
    fn read_u64_crosses_word_boundary() {
        let data = 0xdead_beef_cafe_f00du64.to_le_bytes();
        let mut r = SourceReader::new(&data);
        assert_eq!(r.read_u64(ByteOrder::Little).unwrap(), 0xdead_beef_cafe_f00d);
    }

    #[test]
    fn read_i16_sign_extends() {
        let data = [0xfe, 0xff];
        let mut r = SourceReader::new(&data);
        assert_eq!(r.read_i16(ByteOrder::Little).unwrap(), -2);
    }

    #[test]
    fn short_read_reports_position_and_available() {
        let data = [0u8; 6];
        let mut r = SourceReader::new(&data);
        r.seek_abs(4);
        match r.read(8) {
            Err(DecodeError::Truncated {
                position,
                requested,
                available,
            }) => {
                assert_eq!(position, 4);
                assert_eq!(requested, 8);
                assert_eq!(available, 2);
            }
            other => panic!("expected Truncated, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn read_past_end_after_far_seek() {
        let data = [0u8; 4];
        let mut r = SourceReader::new(&data);
        r.seek_abs(100);
        match r.read(1) {
            Err(DecodeError::Truncated { available, .. }) => assert_eq!(available, 0),
            other => panic!("expected Truncated, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn seek_rel_below_zero_fails() {
        let data = [0u8; 4];
        let mut r = SourceReader::new(&data);
        r.seek_abs(2);
        assert!(r.seek_rel(-3).is_err());
        assert!(r.seek_rel(-2).is_ok());
        assert_eq!(r.tell(), 0);
    }

    #[test]
    fn name_from_bytes_stops_at_nul() {
        assert_eq!(name_from_bytes(b"__TEXT\0\0\0\0\0\0\0\0\0\0"), "__TEXT");
        assert_eq!(name_from_bytes(b"0123456789abcdef"), "0123456789abcdef");
        assert_eq!(name_from_bytes(b"\0\0\0\0"), "");
    }

    #[test]
    fn name_from_bytes_replaces_invalid_utf8() {
        let name = name_from_bytes(&[0x5f, 0xff, 0x5f, 0x00]);
        assert!(name.starts_with('_'));
        assert!(name.contains('\u{fffd}'));
    }
}
