pub mod registry;
pub mod packet;
pub mod compression;
pub mod frame;
pub mod transport;

pub use registry::{Direction, PacketKind, PacketRegistry, ProtocolPhase, PROTOCOL_763};
pub use packet::{
    ClientInformation, ClientboundPacket, PositionSync, RawPacket, Relativity,
    ResourcePackOffer, ServerboundPacket, INTENT_LOGIN,
};
pub use compression::Compression;
pub use frame::{FrameCodec, MAX_FRAME_LEN};
pub use transport::Transport;
