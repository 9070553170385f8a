use crate::protocol::registry::ProtocolPhase;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed varint: more than {max_bytes} bytes without terminating")]
    MalformedVarint { max_bytes: usize },

    #[error("truncated field: need {need} bytes, have {have}")]
    TruncatedField { need: usize, have: usize },

    #[error("string too long: {len} bytes (max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    #[error("compression fault: {0}")]
    CompressionFault(String),

    #[error("unexpected packet {id:#04x} during {phase:?}")]
    UnexpectedPacket { phase: ProtocolPhase, id: i32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("connection timeout")]
    ConnectionTimeout,

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl Error {
    /// Whether the error came from undecodable input rather than the socket or setup.
    pub fn is_protocol_fault(&self) -> bool {
        matches!(
            self,
            Error::MalformedVarint { .. }
                | Error::TruncatedField { .. }
                | Error::StringTooLong { .. }
                | Error::InvalidPacket(_)
                | Error::FrameTooLarge { .. }
                | Error::CompressionFault(_)
                | Error::UnexpectedPacket { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_faults_are_told_apart_from_io() {
        assert!(Error::MalformedVarint { max_bytes: 5 }.is_protocol_fault());
        assert!(Error::UnexpectedPacket { phase: ProtocolPhase::Login, id: 0x01 }.is_protocol_fault());
        assert!(Error::CompressionFault("size mismatch".into()).is_protocol_fault());

        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(!Error::from(reset).is_protocol_fault());
        assert!(!Error::ConnectionTimeout.is_protocol_fault());
        assert!(!Error::InvalidConfig("speed".into()).is_protocol_fault());
    }
}
