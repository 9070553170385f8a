use bytes::{Buf, BytesMut};

use crate::codec::{varint, BinaryReader};
use crate::error::{Error, Result};
use super::compression::Compression;
use super::packet::RawPacket;

/// Largest frame a 3-byte length prefix can describe
pub const MAX_FRAME_LEN: usize = 2_097_151;

/// Splits a byte stream into packets and builds outgoing frames.
///
/// Frame layout: `varint(length)` followed by `length` bytes of body.
/// Without compression the body is `varint(id) + payload`; with it, the
/// body is whatever [`Compression::compress`] produced from that.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    compression: Option<Compression>,
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self { compression: None, max_frame_len }
    }

    /// Apply a server-declared threshold to every later frame in both directions
    pub fn set_compression(&mut self, threshold: i32) {
        self.compression = Compression::from_threshold(threshold);
    }

    pub fn encode(&self, packet: &RawPacket, dst: &mut BytesMut) -> Result<()> {
        let mut body = BytesMut::with_capacity(packet.payload.len() + varint::MAX_VARINT_LEN);
        varint::write_varint(&mut body, packet.id as u32);
        body.extend_from_slice(&packet.payload);

        let body = match &self.compression {
            Some(c) => {
                let mut wrapped = BytesMut::with_capacity(body.len() + varint::MAX_VARINT_LEN);
                c.compress(&body, &mut wrapped)?;
                wrapped
            }
            None => body,
        };

        if body.len() > self.max_frame_len {
            return Err(Error::FrameTooLarge { len: body.len(), max: self.max_frame_len });
        }
        varint::write_varint(dst, body.len() as u32);
        dst.extend_from_slice(&body);
        Ok(())
    }

    /// Take one complete packet off the front of `src`, if there is one
    pub fn decode(&self, src: &mut BytesMut) -> Result<Option<RawPacket>> {
        let Some((len, prefix)) = varint::peek_varint(&src[..])? else {
            return Ok(None);
        };
        let len = len as usize;
        if len > self.max_frame_len {
            return Err(Error::FrameTooLarge { len, max: self.max_frame_len });
        }
        if src.len() < prefix + len {
            src.reserve(prefix + len - src.len());
            return Ok(None);
        }

        src.advance(prefix);
        let frame = src.split_to(len).freeze();
        let body = match &self.compression {
            Some(c) => c.decompress(frame)?,
            None => frame,
        };

        let mut reader = BinaryReader::new(body);
        let id = reader.read_varint_i32()?;
        Ok(Some(RawPacket { id, payload: reader.read_remaining() }))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN)
    }
}
