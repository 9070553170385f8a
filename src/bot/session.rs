//! Per-connection protocol state machine
//!
//! The session never touches a socket or a clock. Inbound packets, timer
//! expiries and ticks go in; [`Command`]s for the driver come out. That
//! keeps the whole login-to-roaming sequence testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use crate::bot::movement::{MovementConfig, MovementSimulator, Pose};
use crate::client::events::{BotEvent, CloseReason, EventCollector, EventHandler};
use crate::config::BotConfig;
use crate::error::{Error, Result};
use crate::protocol::packet::{
    ClientInformation, ClientboundPacket, RawPacket, ServerboundPacket, INTENT_LOGIN,
};
use crate::protocol::registry::{PacketRegistry, ProtocolPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Handshaking,
    LoggingIn,
    /// Logged in, waiting out the settle delays before roaming
    Configuring,
    Playing,
}

impl SessionPhase {
    /// Id table used to read inbound packets in this phase
    pub fn protocol_phase(self) -> ProtocolPhase {
        match self {
            Self::Handshaking => ProtocolPhase::Handshake,
            Self::LoggingIn => ProtocolPhase::Login,
            Self::Configuring | Self::Playing => ProtocolPhase::Play,
        }
    }
}

/// Deferred actions the driver arms on the session's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    SendClientInformation,
    StartPlaying,
}

/// Work the driver must carry out, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(ServerboundPacket),
    EnableCompression(i32),
    Schedule { timer: Timer, delay: Duration },
    StartTicking { interval: Duration },
    Close(CloseReason),
}

pub struct Session<R> {
    config: Arc<BotConfig>,
    registry: PacketRegistry,
    username: String,
    uuid: Option<Uuid>,
    phase: SessionPhase,
    compression_threshold: Option<i32>,
    movement: MovementSimulator<R>,
    closed: Option<CloseReason>,
    events: EventCollector,
}

impl<R: Rng> Session<R> {
    pub fn new(config: Arc<BotConfig>, username: impl Into<String>, rng: R) -> Self {
        let movement = MovementSimulator::new(MovementConfig::from(config.as_ref()), rng);
        Self {
            config,
            registry: PacketRegistry::default(),
            username: username.into(),
            uuid: None,
            phase: SessionPhase::Handshaking,
            compression_threshold: None,
            movement,
            closed: None,
            events: EventCollector::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn compression_threshold(&self) -> Option<i32> {
        self.compression_threshold
    }

    pub fn pose(&self) -> Pose {
        self.movement.pose()
    }

    pub fn movement(&self) -> &MovementSimulator<R> {
        &self.movement
    }

    pub fn is_active(&self) -> bool {
        self.closed.is_none()
    }

    pub fn close_reason(&self) -> Option<&CloseReason> {
        self.closed.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<BotEvent> {
        self.events.drain()
    }

    /// Connection is up: announce ourselves and ask to log in
    pub fn start(&mut self) -> Vec<Command> {
        if self.phase != SessionPhase::Handshaking || !self.is_active() {
            return Vec::new();
        }
        self.phase = SessionPhase::LoggingIn;
        vec![
            Command::Send(ServerboundPacket::Handshake {
                protocol_version: self.config.protocol_version,
                server_address: self.config.host.clone(),
                server_port: self.config.port,
                next_state: INTENT_LOGIN,
            }),
            Command::Send(ServerboundPacket::LoginStart {
                username: self.username.clone(),
                uuid: None,
            }),
        ]
    }

    /// Dispatch one inbound packet.
    ///
    /// Any error is fatal for this connection; the session is closed with
    /// [`CloseReason::Fault`] before it is returned.
    pub fn handle_packet(&mut self, raw: RawPacket) -> Result<Vec<Command>> {
        if !self.is_active() {
            return Ok(Vec::new());
        }
        match self.dispatch(raw) {
            Ok(commands) => Ok(commands),
            Err(e) => {
                self.close(CloseReason::Fault(e.to_string()));
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, raw: RawPacket) -> Result<Vec<Command>> {
        let phase = self.phase.protocol_phase();
        let id = raw.id;
        let Some(packet) = ClientboundPacket::decode(&self.registry, phase, raw)? else {
            if phase == ProtocolPhase::Play {
                return Ok(Vec::new());
            }
            return Err(Error::UnexpectedPacket { phase, id });
        };

        match self.phase {
            SessionPhase::Handshaking => Err(Error::UnexpectedPacket { phase, id }),
            SessionPhase::LoggingIn => self.handle_login(packet, id),
            SessionPhase::Configuring | SessionPhase::Playing => Ok(self.handle_play(packet)),
        }
    }

    fn handle_login(&mut self, packet: ClientboundPacket, id: i32) -> Result<Vec<Command>> {
        match packet {
            ClientboundPacket::LoginDisconnect { reason } => {
                Ok(vec![self.close(CloseReason::LoginRejected(reason))])
            }
            ClientboundPacket::LoginSuccess { uuid, username } => {
                self.uuid = Some(uuid);
                self.username = username.clone();
                self.phase = SessionPhase::Configuring;
                self.events.on_event(BotEvent::LoggedIn { uuid, username });
                Ok(vec![Command::Schedule {
                    timer: Timer::SendClientInformation,
                    delay: self.config.settle_delay(),
                }])
            }
            ClientboundPacket::SetCompression { threshold } => {
                self.compression_threshold = Some(threshold);
                self.events.on_event(BotEvent::CompressionEnabled { threshold });
                Ok(vec![Command::EnableCompression(threshold)])
            }
            _ => Err(Error::UnexpectedPacket { phase: ProtocolPhase::Login, id }),
        }
    }

    fn handle_play(&mut self, packet: ClientboundPacket) -> Vec<Command> {
        match packet {
            ClientboundPacket::Disconnect { reason } => vec![self.close(CloseReason::Kicked(reason))],
            ClientboundPacket::KeepAlive { id } => {
                vec![Command::Send(ServerboundPacket::KeepAliveResponse { id })]
            }
            ClientboundPacket::Ping { id } => vec![Command::Send(ServerboundPacket::Pong { id })],
            ClientboundPacket::SynchronizePlayerPosition(sync) => {
                let pose = self.movement.apply_correction(&sync);
                self.events.on_event(BotEvent::Teleported { pose, teleport_id: sync.teleport_id });
                vec![Command::Send(ServerboundPacket::ConfirmTeleportation {
                    teleport_id: sync.teleport_id,
                })]
            }
            ClientboundPacket::ResourcePackPush(offer) => {
                self.events.on_event(BotEvent::ResourcePackOffered(offer));
                vec![Command::Send(ServerboundPacket::ResourcePackResponse {
                    result: self.config.resource_pack_response,
                })]
            }
            _ => Vec::new(),
        }
    }

    /// A deferred action came due. Does nothing once the session is closed.
    pub fn on_timer(&mut self, timer: Timer) -> Vec<Command> {
        if !self.is_active() || self.phase != SessionPhase::Configuring {
            return Vec::new();
        }
        match timer {
            Timer::SendClientInformation => vec![
                Command::Send(ServerboundPacket::ClientInformation(self.client_information())),
                Command::Schedule { timer: Timer::StartPlaying, delay: self.config.play_delay() },
            ],
            Timer::StartPlaying => {
                self.phase = SessionPhase::Playing;
                vec![Command::StartTicking { interval: self.config.tick_interval() }]
            }
        }
    }

    fn client_information(&self) -> ClientInformation {
        ClientInformation {
            locale: self.config.locale.clone(),
            view_distance: self.config.view_distance,
            chat_mode: 0,
            chat_colors: true,
            skin_parts: 0,
            main_hand: 0,
            text_filtering: false,
            server_listing: true,
        }
    }

    /// One movement tick: the position packet to send, if the bot has spawned
    pub fn tick(&mut self) -> Option<ServerboundPacket> {
        if !self.is_active() || self.phase != SessionPhase::Playing {
            return None;
        }
        let pose = self.movement.step()?;
        Some(ServerboundPacket::SetPlayerPositionAndRotation {
            x: pose.x,
            y: pose.y,
            z: pose.z,
            yaw: pose.yaw,
            pitch: 0.0,
            on_ground: true,
        })
    }

    /// End the session. Only the first reason sticks.
    pub fn close(&mut self, reason: CloseReason) -> Command {
        if self.closed.is_none() {
            self.closed = Some(reason.clone());
            self.events.on_event(BotEvent::Closed { reason: reason.clone() });
        }
        Command::Close(reason)
    }
}
