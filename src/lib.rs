//! Minecraft stress client
//!
//! Headless bots that speak enough of the Java Edition protocol (763,
//! 1.20.1) to log in to a server, stay connected and wander around it,
//! so that many of them together put realistic load on the server.

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod client;
pub mod bot;

pub use error::{Error, Result};
pub use config::BotConfig;
pub use codec::{BinaryReader, BinaryWriter};
pub use protocol::{
    ClientboundPacket, FrameCodec, PacketRegistry, ProtocolPhase,
    RawPacket, ServerboundPacket, Transport,
};
pub use bot::{MovementSimulator, Pose, Session, SessionPhase};
pub use client::{BotEvent, BotOutcome, CloseReason, Connection, ShutdownHandle, Swarm, SwarmOptions};
