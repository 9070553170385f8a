use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::protocol::frame::FrameCodec;
use crate::protocol::packet::{RawPacket, ServerboundPacket};
use crate::protocol::registry::PacketRegistry;

const READ_CHUNK: usize = 8 * 1024;

/// Framed packet stream
///
/// Outgoing packets are encoded into a write buffer as they are queued,
/// so each one is framed with the compression setting in force at that
/// moment. `flush` pushes the buffer to the socket.
pub struct Transport<S> {
    stream: S,
    codec: FrameCodec,
    registry: PacketRegistry,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl Transport<TcpStream> {
    pub async fn connect(addr: &str, timeout: Duration, max_frame_len: usize) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)??;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream, max_frame_len))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Transport<S> {
    pub fn new(stream: S, max_frame_len: usize) -> Self {
        Self {
            stream,
            codec: FrameCodec::new(max_frame_len),
            registry: PacketRegistry::default(),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            write_buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    pub fn set_compression(&mut self, threshold: i32) {
        self.codec.set_compression(threshold);
    }

    pub fn queue(&mut self, packet: &ServerboundPacket) -> Result<()> {
        let raw = packet.to_raw(&self.registry)?;
        self.codec.encode(&raw, &mut self.write_buf)
    }

    pub async fn flush(&mut self) -> Result<()> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        self.stream.write_all_buf(&mut self.write_buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn send(&mut self, packet: &ServerboundPacket) -> Result<()> {
        self.queue(packet)?;
        self.flush().await
    }

    /// Next inbound packet, or `None` once the peer has closed cleanly.
    ///
    /// Cancel safe: bytes already read stay buffered for the next call.
    pub async fn recv(&mut self) -> Result<Option<RawPacket>> {
        loop {
            if let Some(packet) = self.codec.decode(&mut self.read_buf)? {
                return Ok(Some(packet));
            }
            self.read_buf.reserve(READ_CHUNK);
            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                if self.read_buf.is_empty() {
                    return Ok(None);
                }
                return Err(Error::Io(format!(
                    "connection closed with {} bytes of a partial frame",
                    self.read_buf.len()
                )));
            }
        }
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.flush().await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}
