//! Threshold-based zlib compression of packet bodies
//!
//! Once enabled, a packet body (id + payload) is preceded by a varint
//! `data_length`: the uncompressed size when the rest is zlib data, or 0
//! when the body is below the threshold and sent as-is.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::codec::varint;
use crate::error::{Error, Result};

/// Largest decompressed body a server may declare (2^23 bytes)
pub const MAX_DECOMPRESSED_LEN: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct Compression {
    threshold: usize,
    level: flate2::Compression,
}

impl Compression {
    /// A negative threshold means the server turned compression off
    pub fn from_threshold(threshold: i32) -> Option<Self> {
        (threshold >= 0).then(|| Self {
            threshold: threshold as usize,
            level: flate2::Compression::default(),
        })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Append `data_length` + (zlib or raw) body to `dst`
    pub fn compress(&self, body: &[u8], dst: &mut BytesMut) -> Result<()> {
        if body.len() < self.threshold {
            varint::write_varint(dst, 0);
            dst.put_slice(body);
            return Ok(());
        }

        varint::write_varint(dst, body.len() as u32);
        let mut encoder = ZlibEncoder::new((&mut *dst).writer(), self.level);
        encoder.write_all(body).map_err(|e| Error::CompressionFault(e.to_string()))?;
        encoder.finish().map_err(|e| Error::CompressionFault(e.to_string()))?;
        Ok(())
    }

    /// Undo [`Compression::compress`] on a whole frame
    pub fn decompress(&self, mut frame: Bytes) -> Result<Bytes> {
        let data_length = varint::read_varint(&mut frame)? as usize;
        if data_length == 0 {
            return Ok(frame);
        }
        if data_length > MAX_DECOMPRESSED_LEN {
            return Err(Error::CompressionFault(format!(
                "declared size {data_length} exceeds {MAX_DECOMPRESSED_LEN}"
            )));
        }

        let mut body = Vec::with_capacity(data_length);
        // Read one byte past the declared size so an overlong stream is caught.
        ZlibDecoder::new(frame.reader())
            .take(data_length as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|e| Error::CompressionFault(e.to_string()))?;

        if body.len() != data_length {
            return Err(Error::CompressionFault(format!(
                "declared size {data_length}, inflated to {}",
                body.len()
            )));
        }
        Ok(Bytes::from(body))
    }
}
