//! Base-128 variable-length integers.
//!
//! Each byte carries 7 data bits, least significant group first; the high
//! bit is set on every byte except the last. A 32-bit value takes at most
//! 5 bytes and a 64-bit value at most 10.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};

pub const MAX_VARINT_LEN: usize = 5;
pub const MAX_VARLONG_LEN: usize = 10;

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Number of bytes `value` occupies when encoded.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

pub fn write_varint<B: BufMut>(buf: &mut B, value: u32) {
    write_varlong(buf, value as u64);
}

pub fn write_varlong<B: BufMut>(buf: &mut B, mut value: u64) {
    loop {
        if value & !(SEGMENT_BITS as u64) == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value as u8 & SEGMENT_BITS) | CONTINUE_BIT);
        value >>= 7;
    }
}

pub fn read_varint<B: Buf>(buf: &mut B) -> Result<u32> {
    read_var(buf, MAX_VARINT_LEN).map(|v| v as u32)
}

pub fn read_varlong<B: Buf>(buf: &mut B) -> Result<u64> {
    read_var(buf, MAX_VARLONG_LEN)
}

fn read_var<B: Buf>(buf: &mut B, max_bytes: usize) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..max_bytes {
        if !buf.has_remaining() {
            return Err(Error::TruncatedField { need: i + 1, have: i });
        }
        let byte = buf.get_u8();
        value |= ((byte & SEGMENT_BITS) as u64) << (7 * i);
        if byte & CONTINUE_BIT == 0 {
            return Ok(value);
        }
    }
    Err(Error::MalformedVarint { max_bytes })
}

/// Decode a varint at the start of `data` without consuming it.
///
/// Returns `Ok(None)` when `data` ends before the varint terminates, so a
/// frame decoder can wait for more bytes instead of failing.
pub fn peek_varint(data: &[u8]) -> Result<Option<(u32, usize)>> {
    let mut value = 0u32;
    for (i, &byte) in data.iter().take(MAX_VARINT_LEN).enumerate() {
        value |= ((byte & SEGMENT_BITS) as u32) << (7 * i);
        if byte & CONTINUE_BIT == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        return Err(Error::MalformedVarint { max_bytes: MAX_VARINT_LEN });
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn encode(value: u64) -> BytesMut {
        let mut buf = BytesMut::new();
        write_varlong(&mut buf, value);
        buf
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(&encode(0)[..], &[0x00]);
        assert_eq!(&encode(1)[..], &[0x01]);
        assert_eq!(&encode(127)[..], &[0x7F]);
        assert_eq!(&encode(128)[..], &[0x80, 0x01]);
        assert_eq!(&encode(255)[..], &[0xFF, 0x01]);
        assert_eq!(&encode(25565)[..], &[0xDD, 0xC7, 0x01]);
        assert_eq!(&encode(2097151)[..], &[0xFF, 0xFF, 0x7F]);

        let mut buf = BytesMut::new();
        write_varint(&mut buf, u32::MAX);
        assert_eq!(&buf[..], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_negative_i32_uses_five_bytes() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, -1i32 as u32);
        assert_eq!(buf.len(), 5);
        assert_eq!(read_varint(&mut buf.freeze()).unwrap() as i32, -1);
    }

    #[test]
    fn test_roundtrip_and_length() {
        for shift in 0..64 {
            for value in [1u64 << shift, (1u64 << shift) - 1, (1u64 << shift) + 1] {
                let buf = encode(value);
                assert_eq!(buf.len(), varint_len(value), "length of {value}");
                assert_eq!(read_varlong(&mut buf.freeze()).unwrap(), value);
            }
        }
        let buf = encode(u64::MAX);
        assert_eq!(buf.len(), MAX_VARLONG_LEN);
        assert_eq!(read_varlong(&mut buf.freeze()).unwrap(), u64::MAX);
    }

    #[test]
    fn test_unterminated_is_malformed() {
        let data = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        let err = read_varint(&mut &data[..]).unwrap_err();
        assert!(matches!(err, Error::MalformedVarint { max_bytes: 5 }));

        let err = peek_varint(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedVarint { .. }));
    }

    #[test]
    fn test_truncated_varint() {
        let data = [0x80u8, 0x80];
        let err = read_varint(&mut &data[..]).unwrap_err();
        assert!(matches!(err, Error::TruncatedField { need: 3, have: 2 }));
    }

    #[test]
    fn test_peek_waits_for_more_bytes() {
        assert_eq!(peek_varint(&[]).unwrap(), None);
        assert_eq!(peek_varint(&[0xDD, 0xC7]).unwrap(), None);
        assert_eq!(peek_varint(&[0xDD, 0xC7, 0x01, 0xAA]).unwrap(), Some((25565, 3)));
    }
}
