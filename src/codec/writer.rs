use bytes::{BufMut, BytesMut};
use uuid::Uuid;

use super::varint;

/// Big-endian binary writer into any byte sink
pub struct BinaryWriter<B> {
    buf: B,
}

impl BinaryWriter<BytesMut> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity) }
    }
}

impl<B: BufMut> BinaryWriter<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(if v { 1 } else { 0 });
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.put_i16(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.put_f32(v);
    }

    pub fn write_f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    pub fn write_varint(&mut self, v: u32) {
        varint::write_varint(&mut self.buf, v);
    }

    pub fn write_varint_i32(&mut self, v: i32) {
        self.write_varint(v as u32);
    }

    pub fn write_varlong(&mut self, v: u64) {
        varint::write_varlong(&mut self.buf, v);
    }

    /// Write a string (varint byte length + UTF-8 bytes)
    pub fn write_string(&mut self, s: &str) {
        self.write_varint(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    /// Write a boolean-prefixed optional string
    pub fn write_string_opt(&mut self, s: Option<&str>) {
        match s {
            None => self.write_bool(false),
            Some(s) => {
                self.write_bool(true);
                self.write_string(s);
            }
        }
    }

    pub fn write_uuid(&mut self, uuid: Uuid) {
        let (high, low) = uuid.as_u64_pair();
        self.write_i64(high as i64);
        self.write_i64(low as i64);
    }
}

impl Default for BinaryWriter<BytesMut> {
    fn default() -> Self {
        Self::new(BytesMut::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::reader::BinaryReader;

    #[test]
    fn test_roundtrip_primitives() {
        let mut writer = BinaryWriter::default();
        writer.write_u8(0x42);
        writer.write_u16(25565);
        writer.write_i64(-7);
        writer.write_f64(-12.5);
        writer.write_varint(300);

        let data = writer.into_inner().freeze();
        assert_eq!(&data[..3], &[0x42, 0x63, 0xDD]);

        let mut reader = BinaryReader::new(data);
        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u16().unwrap(), 25565);
        assert_eq!(reader.read_i64().unwrap(), -7);
        assert_eq!(reader.read_f64().unwrap(), -12.5);
        assert_eq!(reader.read_varint().unwrap(), 300);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_roundtrip_strings() {
        let samples = ["", "Bot42", "en_GB", "{\"text\":\"kicked\"}", "grüße ☃ 🚀"];
        let mut writer = BinaryWriter::default();
        for s in samples {
            writer.write_string(s);
        }
        writer.write_string_opt(None);
        writer.write_string_opt(Some("prompt"));

        let mut reader = BinaryReader::new(writer.into_inner().freeze());
        for s in samples {
            assert_eq!(reader.read_string().unwrap(), s);
        }
        assert_eq!(reader.read_string_opt().unwrap(), None);
        assert_eq!(reader.read_string_opt().unwrap().as_deref(), Some("prompt"));
    }

    #[test]
    fn test_string_length_counts_utf8_bytes() {
        let mut writer = BinaryWriter::default();
        writer.write_string("é");
        assert_eq!(&writer.into_inner()[..], &[0x02, 0xC3, 0xA9]);
    }

    #[test]
    fn test_roundtrip_uuid() {
        let uuid = Uuid::from_u64_pair(0x8000_0000_0000_0001, 0xFFFF_0000_1234_5678);
        let mut writer = BinaryWriter::default();
        writer.write_uuid(uuid);
        let data = writer.into_inner();
        assert_eq!(data.len(), 16);
        assert_eq!(BinaryReader::new(data.freeze()).read_uuid().unwrap(), uuid);
    }

    #[test]
    fn test_writes_into_caller_buffer() {
        let mut out = Vec::new();
        {
            let mut writer = BinaryWriter::new(&mut out);
            writer.write_i32(1);
        }
        assert_eq!(out, vec![0, 0, 0, 1]);
    }
}
