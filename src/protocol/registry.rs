//! Packet id table
//!
//! Ids are only meaningful together with a direction and a protocol phase.
//! The table below covers the packets a roaming bot needs for protocol 763
//! (1.20 / 1.20.1); supporting another id means adding a row here, dispatch
//! is keyed on [`PacketKind`] and never sees raw numbers.

/// Who sends the packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Clientbound,
    Serverbound,
}

/// Protocol phase that scopes packet ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolPhase {
    Handshake,
    Login,
    Play,
}

/// Semantic packet identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    // Serverbound
    Handshake,
    LoginStart,
    ConfirmTeleportation,
    ClientInformation,
    KeepAliveResponse,
    SetPlayerPositionAndRotation,
    Pong,
    ResourcePackResponse,

    // Clientbound
    LoginDisconnect,
    EncryptionRequest,
    LoginSuccess,
    SetCompression,
    LoginPluginRequest,
    Disconnect,
    KeepAlive,
    Ping,
    SynchronizePlayerPosition,
    ResourcePackPush,
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub direction: Direction,
    pub phase: ProtocolPhase,
    pub kind: PacketKind,
    pub id: i32,
}

const fn entry(direction: Direction, phase: ProtocolPhase, kind: PacketKind, id: i32) -> RegistryEntry {
    RegistryEntry { direction, phase, kind, id }
}

use Direction::{Clientbound as C, Serverbound as S};
use ProtocolPhase::{Handshake as H, Login as L, Play as P};

pub const PROTOCOL_763: &[RegistryEntry] = &[
    entry(S, H, PacketKind::Handshake, 0x00),

    entry(S, L, PacketKind::LoginStart, 0x00),
    entry(C, L, PacketKind::LoginDisconnect, 0x00),
    entry(C, L, PacketKind::EncryptionRequest, 0x01),
    entry(C, L, PacketKind::LoginSuccess, 0x02),
    entry(C, L, PacketKind::SetCompression, 0x03),
    entry(C, L, PacketKind::LoginPluginRequest, 0x04),

    entry(S, P, PacketKind::ConfirmTeleportation, 0x00),
    entry(S, P, PacketKind::ClientInformation, 0x08),
    entry(S, P, PacketKind::KeepAliveResponse, 0x12),
    entry(S, P, PacketKind::SetPlayerPositionAndRotation, 0x15),
    entry(S, P, PacketKind::Pong, 0x23),
    entry(S, P, PacketKind::ResourcePackResponse, 0x24),
    entry(C, P, PacketKind::Disconnect, 0x1A),
    entry(C, P, PacketKind::KeepAlive, 0x23),
    entry(C, P, PacketKind::Ping, 0x32),
    entry(C, P, PacketKind::SynchronizePlayerPosition, 0x3C),
    entry(C, P, PacketKind::ResourcePackPush, 0x40),
];

/// Lookup over a static id table
#[derive(Debug, Clone, Copy)]
pub struct PacketRegistry {
    entries: &'static [RegistryEntry],
}

impl PacketRegistry {
    pub const fn new(entries: &'static [RegistryEntry]) -> Self {
        Self { entries }
    }

    pub fn kind_of(&self, direction: Direction, phase: ProtocolPhase, id: i32) -> Option<PacketKind> {
        self.entries
            .iter()
            .find(|e| e.direction == direction && e.phase == phase && e.id == id)
            .map(|e| e.kind)
    }

    pub fn id_of(&self, direction: Direction, phase: ProtocolPhase, kind: PacketKind) -> Option<i32> {
        self.entries
            .iter()
            .find(|e| e.direction == direction && e.phase == phase && e.kind == kind)
            .map(|e| e.id)
    }

    /// Direction and phase a packet kind belongs to
    pub fn scope_of(&self, kind: PacketKind) -> Option<(Direction, ProtocolPhase)> {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| (e.direction, e.phase))
    }
}

impl Default for PacketRegistry {
    fn default() -> Self {
        Self::new(PROTOCOL_763)
    }
}
