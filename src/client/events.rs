use uuid::Uuid;

use crate::bot::movement::Pose;
use crate::protocol::packet::ResourcePackOffer;

/// Things an operator watching the swarm wants to hear about
#[derive(Debug, Clone, PartialEq)]
pub enum BotEvent {
    LoggedIn {
        uuid: Uuid,
        username: String,
    },

    CompressionEnabled {
        threshold: i32,
    },

    /// Server overwrote the bot's position
    Teleported {
        pose: Pose,
        teleport_id: i32,
    },

    ResourcePackOffered(ResourcePackOffer),

    /// Session ended; no further events follow
    Closed {
        reason: CloseReason,
    },
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Disconnect packet during login
    LoginRejected(String),
    /// Disconnect packet after login
    Kicked(String),
    /// Socket closed by the peer
    ConnectionLost,
    /// Local shutdown request
    Shutdown,
    /// Protocol or I/O failure on this connection
    Fault(String),
}

impl CloseReason {
    /// Whether the server ended the session on purpose
    pub fn is_server_initiated(&self) -> bool {
        matches!(self, Self::LoginRejected(_) | Self::Kicked(_))
    }
}

/// Event handler trait
pub trait EventHandler {
    fn on_event(&mut self, event: BotEvent);
}

/// Simple event collector
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<BotEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn drain(&mut self) -> Vec<BotEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventHandler for EventCollector {
    fn on_event(&mut self, event: BotEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_collector() {
        let mut collector = EventCollector::new();
        assert!(collector.is_empty());

        collector.on_event(BotEvent::CompressionEnabled { threshold: 256 });
        collector.on_event(BotEvent::Closed { reason: CloseReason::Shutdown });

        let events = collector.drain();
        assert_eq!(events.len(), 2);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_server_initiated_reasons() {
        assert!(CloseReason::Kicked("bye".into()).is_server_initiated());
        assert!(CloseReason::LoginRejected("full".into()).is_server_initiated());
        assert!(!CloseReason::ConnectionLost.is_server_initiated());
        assert!(!CloseReason::Fault("bad varint".into()).is_server_initiated());
    }
}
