pub mod movement;
pub mod session;

pub use movement::{MovementConfig, MovementSimulator, Pose, VerticalIntent};
pub use session::{Command, Session, SessionPhase, Timer};
