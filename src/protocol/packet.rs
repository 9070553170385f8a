//! Typed packets for the subset of the protocol a roaming bot speaks.

use bitflags::bitflags;
use bytes::{BufMut, Bytes};
use uuid::Uuid;

use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};
use super::registry::{Direction, PacketKind, PacketRegistry, ProtocolPhase};

/// Handshake `next_state` value asking for the login phase
pub const INTENT_LOGIN: u32 = 2;

bitflags! {
    /// Which fields of a position sync are relative to the current pose
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Relativity: u8 {
        const X = 0x01;
        const Y = 0x02;
        const Z = 0x04;
        const Y_ROT = 0x08;
        const X_ROT = 0x10;
    }
}

/// A framed packet before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub id: i32,
    pub payload: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSync {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub flags: Relativity,
    pub teleport_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePackOffer {
    pub url: String,
    pub hash: String,
    pub forced: bool,
    pub prompt: Option<String>,
}

/// Packets the server sends that the bot understands
#[derive(Debug, Clone, PartialEq)]
pub enum ClientboundPacket {
    LoginDisconnect { reason: String },
    LoginSuccess { uuid: Uuid, username: String },
    SetCompression { threshold: i32 },
    Disconnect { reason: String },
    KeepAlive { id: i64 },
    Ping { id: i32 },
    SynchronizePlayerPosition(PositionSync),
    ResourcePackPush(ResourcePackOffer),
    /// A known id the bot has no handler for
    Unhandled { kind: PacketKind },
}

impl ClientboundPacket {
    /// Decode a raw packet by looking its id up in the given phase.
    ///
    /// Returns `Ok(None)` when the id is not in the registry for that phase;
    /// whether that is fatal is the caller's decision.
    pub fn decode(registry: &PacketRegistry, phase: ProtocolPhase, raw: RawPacket) -> Result<Option<Self>> {
        let Some(kind) = registry.kind_of(Direction::Clientbound, phase, raw.id) else {
            return Ok(None);
        };
        let mut r = BinaryReader::new(raw.payload);

        let packet = match kind {
            PacketKind::LoginDisconnect => Self::LoginDisconnect { reason: r.read_string()? },
            PacketKind::LoginSuccess => {
                let uuid = r.read_uuid()?;
                let username = r.read_string()?;
                // Profile properties follow; the bot has no use for them.
                Self::LoginSuccess { uuid, username }
            }
            PacketKind::SetCompression => Self::SetCompression { threshold: r.read_varint_i32()? },
            PacketKind::Disconnect => Self::Disconnect { reason: r.read_string()? },
            PacketKind::KeepAlive => Self::KeepAlive { id: r.read_i64()? },
            PacketKind::Ping => Self::Ping { id: r.read_i32()? },
            PacketKind::SynchronizePlayerPosition => Self::SynchronizePlayerPosition(PositionSync {
                x: r.read_f64()?,
                y: r.read_f64()?,
                z: r.read_f64()?,
                yaw: r.read_f32()?,
                pitch: r.read_f32()?,
                flags: Relativity::from_bits_retain(r.read_u8()?),
                teleport_id: r.read_varint_i32()?,
            }),
            PacketKind::ResourcePackPush => Self::ResourcePackPush(ResourcePackOffer {
                url: r.read_string()?,
                hash: r.read_string()?,
                forced: r.read_bool()?,
                prompt: r.read_string_opt()?,
            }),
            other => Self::Unhandled { kind: other },
        };
        Ok(Some(packet))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInformation {
    pub locale: String,
    pub view_distance: i8,
    pub chat_mode: u32,
    pub chat_colors: bool,
    pub skin_parts: u8,
    pub main_hand: u32,
    pub text_filtering: bool,
    pub server_listing: bool,
}

/// Packets the bot sends
#[derive(Debug, Clone, PartialEq)]
pub enum ServerboundPacket {
    Handshake {
        protocol_version: u32,
        server_address: String,
        server_port: u16,
        next_state: u32,
    },
    LoginStart { username: String, uuid: Option<Uuid> },
    ClientInformation(ClientInformation),
    KeepAliveResponse { id: i64 },
    Pong { id: i32 },
    ConfirmTeleportation { teleport_id: i32 },
    ResourcePackResponse { result: u32 },
    SetPlayerPositionAndRotation {
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    },
}

impl ServerboundPacket {
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Handshake { .. } => PacketKind::Handshake,
            Self::LoginStart { .. } => PacketKind::LoginStart,
            Self::ClientInformation(_) => PacketKind::ClientInformation,
            Self::KeepAliveResponse { .. } => PacketKind::KeepAliveResponse,
            Self::Pong { .. } => PacketKind::Pong,
            Self::ConfirmTeleportation { .. } => PacketKind::ConfirmTeleportation,
            Self::ResourcePackResponse { .. } => PacketKind::ResourcePackResponse,
            Self::SetPlayerPositionAndRotation { .. } => PacketKind::SetPlayerPositionAndRotation,
        }
    }

    /// Resolve the wire id for this packet
    pub fn id(&self, registry: &PacketRegistry) -> Result<i32> {
        let kind = self.kind();
        registry
            .scope_of(kind)
            .and_then(|(direction, phase)| registry.id_of(direction, phase, kind))
            .ok_or_else(|| Error::InvalidPacket(format!("no id registered for {kind:?}")))
    }

    /// Write the payload (everything after the packet id)
    pub fn encode_payload<B: BufMut>(&self, w: &mut BinaryWriter<B>) {
        match self {
            Self::Handshake { protocol_version, server_address, server_port, next_state } => {
                w.write_varint(*protocol_version);
                w.write_string(server_address);
                w.write_u16(*server_port);
                w.write_varint(*next_state);
            }
            Self::LoginStart { username, uuid } => {
                w.write_string(username);
                w.write_bool(uuid.is_some());
                if let Some(uuid) = uuid {
                    w.write_uuid(*uuid);
                }
            }
            Self::ClientInformation(info) => {
                w.write_string(&info.locale);
                w.write_i8(info.view_distance);
                w.write_varint(info.chat_mode);
                w.write_bool(info.chat_colors);
                w.write_u8(info.skin_parts);
                w.write_varint(info.main_hand);
                w.write_bool(info.text_filtering);
                w.write_bool(info.server_listing);
            }
            Self::KeepAliveResponse { id } => w.write_i64(*id),
            Self::Pong { id } => w.write_i32(*id),
            Self::ConfirmTeleportation { teleport_id } => w.write_varint_i32(*teleport_id),
            Self::ResourcePackResponse { result } => w.write_varint(*result),
            Self::SetPlayerPositionAndRotation { x, y, z, yaw, pitch, on_ground } => {
                w.write_f64(*x);
                w.write_f64(*y);
                w.write_f64(*z);
                w.write_f32(*yaw);
                w.write_f32(*pitch);
                w.write_bool(*on_ground);
            }
        }
    }

    pub fn to_raw(&self, registry: &PacketRegistry) -> Result<RawPacket> {
        let mut w = BinaryWriter::with_capacity(64);
        self.encode_payload(&mut w);
        Ok(RawPacket {
            id: self.id(registry)?,
            payload: w.into_inner().freeze(),
        })
    }
}
