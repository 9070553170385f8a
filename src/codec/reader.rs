use bytes::{Buf, Bytes};
use uuid::Uuid;

use crate::error::{Error, Result};
use super::varint;

/// Longest string the protocol allows, in UTF-8 bytes (32767 chars × 4).
pub const MAX_STRING_BYTES: usize = 32767 * 4;

/// Big-endian binary reader over any byte source
pub struct BinaryReader<B> {
    buf: B,
}

impl<B: Buf> BinaryReader<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    fn ensure(&self, need: usize) -> Result<()> {
        let have = self.buf.remaining();
        if have < need {
            return Err(Error::TruncatedField { need, have });
        }
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.buf.advance(n);
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        Ok(self.buf.copy_to_bytes(n))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    pub fn read_varint(&mut self) -> Result<u32> {
        varint::read_varint(&mut self.buf)
    }

    /// Read a varint carrying a signed 32-bit value (ids, thresholds)
    pub fn read_varint_i32(&mut self) -> Result<i32> {
        Ok(self.read_varint()? as i32)
    }

    pub fn read_varlong(&mut self) -> Result<u64> {
        varint::read_varlong(&mut self.buf)
    }

    /// Read a string (varint byte length + UTF-8 bytes)
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_varint()? as usize;
        if len > MAX_STRING_BYTES {
            return Err(Error::StringTooLong { len, max: MAX_STRING_BYTES });
        }
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::InvalidPacket("invalid UTF-8 string".into()))
    }

    /// Read a boolean-prefixed optional string
    pub fn read_string_opt(&mut self) -> Result<Option<String>> {
        if self.read_bool()? {
            Ok(Some(self.read_string()?))
        } else {
            Ok(None)
        }
    }

    /// Read a UUID (two big-endian 64-bit halves, most significant first)
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let high = self.read_i64()? as u64;
        let low = self.read_i64()? as u64;
        Ok(Uuid::from_u64_pair(high, low))
    }

    /// Consume whatever is left
    pub fn read_remaining(&mut self) -> Bytes {
        let n = self.buf.remaining();
        self.buf.copy_to_bytes(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives_big_endian() {
        let data = [
            0x01,
            0x63, 0xDD,
            0x00, 0x00, 0x01, 0x00,
            0x3F, 0x80, 0x00, 0x00,
        ];
        let mut reader = BinaryReader::new(&data[..]);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 25565);
        assert_eq!(reader.read_i32().unwrap(), 256);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_string() {
        let data = [0x05, b'h', b'e', b'l', b'l', b'o', 0x00];
        let mut reader = BinaryReader::new(&data[..]);
        assert_eq!(reader.read_string().unwrap(), "hello");
        assert_eq!(reader.read_string().unwrap(), "");
    }

    #[test]
    fn test_truncated_string() {
        let data = [0x05, b'h', b'e'];
        let mut reader = BinaryReader::new(&data[..]);
        let err = reader.read_string().unwrap_err();
        assert!(matches!(err, Error::TruncatedField { need: 5, have: 2 }));
    }

    #[test]
    fn test_oversized_string_rejected_before_reading() {
        let mut data = Vec::new();
        varint::write_varint(&mut data, (MAX_STRING_BYTES + 1) as u32);
        let mut reader = BinaryReader::new(&data[..]);
        assert!(matches!(reader.read_string(), Err(Error::StringTooLong { .. })));
    }

    #[test]
    fn test_read_uuid() {
        let data = [
            0x06, 0x9a, 0x79, 0xf4, 0x44, 0xe9, 0x4f, 0x72,
            0x6b, 0x9a, 0x8d, 0x3c, 0x52, 0x3f, 0x5c, 0x9d,
        ];
        let mut reader = BinaryReader::new(&data[..]);
        let uuid = reader.read_uuid().unwrap();
        assert_eq!(uuid.to_string(), "069a79f4-44e9-4f72-6b9a-8d3c523f5c9d");
    }

    #[test]
    fn test_reads_across_chained_buffers() {
        let first = &[0x00u8, 0x00][..];
        let second = &[0x00u8, 0x2A, 0x01][..];
        let mut reader = BinaryReader::new(first.chain(second));
        assert_eq!(reader.read_i32().unwrap(), 42);
        assert!(reader.read_bool().unwrap());
    }
}
